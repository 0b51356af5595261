use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

const TILES_PER_BANK: usize = 384;
const TILE_BYTES: usize = 16;

// Variants per palette: horizontal flip x vertical flip
const VARIANTS_PER_PALETTE: usize = 4;

// weave[i] spreads the 8 bits of i across the even bit positions of a u16
static WEAVE: Lazy<[u16; 256]> = Lazy::new(|| {
    let mut table = [0; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        *entry = (0..8).map(|bit| ((i as u16 >> bit) & 0x01) << (2 * bit)).sum();
    }
    table
});

/// Dimensions of the tile cache, which differ between monochrome and color hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TileCacheLayout {
    pub(crate) tile_count: usize,
    pub(crate) color_count: usize,
    // Attributes at or above this value belong to sprites, whose all-zero tiles are cached as
    // transparent
    pub(crate) transparent_cutoff: usize,
}

impl TileCacheLayout {
    pub(crate) const MONOCHROME: Self =
        Self { tile_count: TILES_PER_BANK, color_count: 12, transparent_cutoff: 4 };
    pub(crate) const COLOR: Self =
        Self { tile_count: 2 * TILES_PER_BANK, color_count: 64, transparent_cutoff: 32 };
}

#[derive(Debug, Clone, Default)]
enum CacheEntry {
    #[default]
    Absent,
    Transparent,
    Decoded(Box<[u32; 64]>),
}

/// Lazily decoded 8x8 tiles, one entry per (tile, palette attribute) pair.
#[derive(Debug, Clone)]
pub(crate) struct TileCache {
    layout: TileCacheLayout,
    entries: Vec<CacheEntry>,
    read_state: Vec<bool>,
}

impl TileCache {
    pub(crate) fn new(layout: TileCacheLayout) -> Self {
        Self {
            layout,
            entries: vec![CacheEntry::Absent; layout.tile_count * layout.color_count],
            read_state: vec![false; layout.tile_count],
        }
    }

    pub(crate) fn layout(&self) -> TileCacheLayout {
        self.layout
    }

    /// Drop every decoded variant of a tile whose pattern bytes just changed.
    pub(crate) fn invalidate_tile(&mut self, tile: usize) {
        if !self.read_state.get(tile).copied().unwrap_or(false) {
            return;
        }

        let tile_count = self.layout.tile_count;
        for entry in self.entries.iter_mut().skip(tile).step_by(tile_count) {
            *entry = CacheEntry::Absent;
        }
        self.read_state[tile] = false;
    }

    /// Drop every tile decoded with one palette (all four flip variants of it).
    pub(crate) fn invalidate_palette(&mut self, palette: usize) {
        let stride = self.layout.tile_count * VARIANTS_PER_PALETTE;
        let start = (palette * stride).min(self.entries.len());
        let end = ((palette + 1) * stride).min(self.entries.len());
        self.entries[start..end].fill(CacheEntry::Absent);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.fill(CacheEntry::Absent);
        self.read_state.fill(false);
    }

    /// Return the decoded pixels for `tile` under `attributes`, decoding on a miss. Returns `None`
    /// for sprite tiles where every pixel is color 0.
    ///
    /// `vram` holds both banks back to back; `palette` is the active palette table.
    pub(crate) fn get_or_decode(
        &mut self,
        tile: usize,
        attributes: usize,
        vram: [&[u8]; 2],
        palette: &[u32],
    ) -> Option<&[u32; 64]> {
        let index = tile + self.layout.tile_count * attributes;
        if index >= self.entries.len() {
            return None;
        }

        if matches!(self.entries[index], CacheEntry::Absent) {
            self.entries[index] = self.decode(tile, attributes, vram, palette);
            self.read_state[tile] = true;
        }

        match &self.entries[index] {
            CacheEntry::Decoded(pixels) => Some(pixels),
            CacheEntry::Transparent | CacheEntry::Absent => None,
        }
    }

    fn decode(
        &self,
        tile: usize,
        attributes: usize,
        vram: [&[u8]; 2],
        palette: &[u32],
    ) -> CacheEntry {
        let bank = vram[tile / TILES_PER_BANK];
        let offset = (tile % TILES_PER_BANK) * TILE_BYTES;
        let palette_start = attributes & 0xFC;
        let flip_x = attributes & 0x01 != 0;
        let flip_y = attributes & 0x02 != 0;

        let mut transparent = attributes >= self.layout.transparent_cutoff;
        let mut pixels = [0; 64];
        for row in 0..8 {
            let lo = WEAVE[usize::from(bank[offset + 2 * row])];
            let hi = WEAVE[usize::from(bank[offset + 2 * row + 1])];
            let mut indices = lo | (hi << 1);
            if indices != 0 {
                transparent = false;
            }

            let dst_row = if flip_y { 7 - row } else { row };
            // Lowest bit pair is the rightmost pixel
            for x in (0..8).rev() {
                let dst_x = if flip_x { 7 - x } else { x };
                let color_index = palette_start + usize::from(indices & 0x03);
                pixels[dst_row * 8 + dst_x] = palette.get(color_index).copied().unwrap_or(0);
                indices >>= 2;
            }
        }

        if transparent {
            CacheEntry::Transparent
        } else {
            CacheEntry::Decoded(Box::new(pixels))
        }
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(TileCacheLayout::MONOCHROME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PALETTE: [u32; 12] = [
        0x00_000000,
        0x80_000001,
        0x80_000002,
        0x80_000003,
        0x00_000010,
        0x80_000011,
        0x80_000012,
        0x80_000013,
        0x00_000020,
        0x80_000021,
        0x80_000022,
        0x80_000023,
    ];

    fn vram_with_tile(tile: usize, bytes: [u8; 16]) -> Vec<u8> {
        let mut vram = vec![0; 0x2000];
        vram[tile * 16..tile * 16 + 16].copy_from_slice(&bytes);
        vram
    }

    #[test]
    fn weave_table() {
        assert_eq!(0x0000, WEAVE[0x00]);
        assert_eq!(0x0001, WEAVE[0x01]);
        assert_eq!(0x0004, WEAVE[0x02]);
        assert_eq!(0x4000, WEAVE[0x80]);
        assert_eq!(0x5555, WEAVE[0xFF]);
    }

    #[test]
    fn decode_row() {
        // Row 0: low plane 0b1010_0000, high plane 0b1100_0000 -> colors 3, 2, 1, 0, ...
        let mut bytes = [0; 16];
        bytes[0] = 0xA0;
        bytes[1] = 0xC0;
        let vram = vram_with_tile(5, bytes);
        let mut cache = TileCache::new(TileCacheLayout::MONOCHROME);

        let pixels = *cache.get_or_decode(5, 0, [&vram, &[]], &PALETTE).unwrap();
        assert_eq!(&[PALETTE[3], PALETTE[2], PALETTE[1], PALETTE[0]], &pixels[0..4]);

        let flipped = *cache.get_or_decode(5, 1, [&vram, &[]], &PALETTE).unwrap();
        assert_eq!(&[PALETTE[0], PALETTE[1], PALETTE[2], PALETTE[3]], &flipped[4..8]);

        let flipped_y = *cache.get_or_decode(5, 2, [&vram, &[]], &PALETTE).unwrap();
        assert_eq!(PALETTE[3], flipped_y[56]);
    }

    #[test]
    fn blank_sprite_tiles_are_transparent() {
        let vram = vec![0; 0x2000];
        let mut cache = TileCache::new(TileCacheLayout::MONOCHROME);

        assert!(cache.get_or_decode(0, 4, [&vram, &[]], &PALETTE).is_none());
        assert!(cache.get_or_decode(0, 0, [&vram, &[]], &PALETTE).is_some());
    }

    #[test]
    fn invalidation() {
        let mut bytes = [0; 16];
        bytes[0] = 0xFF;
        let mut vram = vram_with_tile(1, bytes);
        let mut cache = TileCache::new(TileCacheLayout::MONOCHROME);

        assert_eq!(PALETTE[1], cache.get_or_decode(1, 0, [&vram, &[]], &PALETTE).unwrap()[0]);

        vram[16] = 0x00;
        vram[17] = 0xFF;
        // Still cached until invalidated
        assert_eq!(PALETTE[1], cache.get_or_decode(1, 0, [&vram, &[]], &PALETTE).unwrap()[0]);

        cache.invalidate_tile(1);
        assert_eq!(PALETTE[2], cache.get_or_decode(1, 0, [&vram, &[]], &PALETTE).unwrap()[0]);

        let recolored: Vec<_> = PALETTE.iter().map(|color| color | 0x0000_0F00).collect();
        cache.invalidate_palette(0);
        assert_eq!(recolored[2], cache.get_or_decode(1, 0, [&vram, &[]], &recolored).unwrap()[0]);
    }
}
