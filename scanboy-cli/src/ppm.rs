use anyhow::Context;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Write packed `0x__RRGGBB` pixels as a binary PPM image.
pub fn write_ppm<W>(writer: &mut W, frame: &[u32], width: usize, height: usize) -> io::Result<()>
where
    W: Write,
{
    write!(writer, "P6\n{width} {height}\n255\n")?;
    for &pixel in &frame[..width * height] {
        let [_, r, g, b] = pixel.to_be_bytes();
        writer.write_all(&[r, g, b])?;
    }

    Ok(())
}

pub fn save_ppm(
    path: &Path,
    frame: &[u32],
    width: usize,
    height: usize,
) -> Result<(), anyhow::Error> {
    let file = File::create(path)
        .with_context(|| format!("error creating frame dump file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);

    write_ppm(&mut writer, frame, width, height)
        .and_then(|()| writer.flush())
        .with_context(|| format!("error writing frame dump to '{}'", path.display()))?;

    Ok(())
}
