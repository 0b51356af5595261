use crate::graphics::SCREEN_WIDTH;
use crate::memory::ioregisters::IoRegister;
use crate::memory::AddressSpace;
use crate::ppu::{PpuState, BLANK_COLOR};

const SCREEN_WIDTH_I32: i32 = SCREEN_WIDTH as i32;

const LOW_TILE_MAP: usize = 0x1800;
const HIGH_TILE_MAP: usize = 0x1C00;
const VRAM_MASK: usize = 0x1FFF;

const TILES_PER_BANK: usize = 384;
const OAM_ENTRY_LEN: usize = 4;

// Tile map attribute / OAM attribute bit marking "draw behind background colors 1-3"
const PRIORITY_BIT: u8 = 0x80;

const OPAQUE: u32 = 0x8000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Blend {
    Replace,
    Sprite,
    BehindBackground,
}

// Copy one 8-pixel row of a decoded tile into the frame buffer, clipped to the screen
fn blit_row(
    frame_buffer: &mut [u32],
    pixels: &[u32; 64],
    x: i32,
    line: usize,
    source_line: usize,
    blend: Blend,
) {
    let row = &mut frame_buffer[line * SCREEN_WIDTH..(line + 1) * SCREEN_WIDTH];
    let source = &pixels[source_line * 8..source_line * 8 + 8];

    for (i, &pixel) in source.iter().enumerate() {
        let screen_x = x + i as i32;
        if !(0..SCREEN_WIDTH_I32).contains(&screen_x) {
            continue;
        }

        let dst = &mut row[screen_x as usize];
        match blend {
            Blend::Replace => {
                *dst = pixel;
            }
            Blend::Sprite => {
                if pixel & OPAQUE != 0 {
                    *dst = pixel;
                }
            }
            Blend::BehindBackground => {
                if pixel & OPAQUE != 0 && *dst & OPAQUE == 0 {
                    *dst = pixel;
                }
            }
        }
    }
}

impl PpuState {
    /// Draw the current scanline: background and window, sprites, then any color-mode tiles
    /// flagged to sit above sprites.
    pub(crate) fn render_scanline(&mut self, address_space: &AddressSpace) {
        let line = self.scanline;
        if usize::from(line) * SCREEN_WIDTH >= self.frame_buffer.len() {
            return;
        }

        if line == 0 {
            self.window_line = 0;
        }

        let wy = address_space.io(IoRegister::WY);
        let wx = address_space.io(IoRegister::WX);
        let window_left = if self.lcdc.window_enabled && wy <= line {
            SCREEN_WIDTH_I32.min(i32::from(wx) - 7)
        } else {
            SCREEN_WIDTH_I32
        };

        let skipped_tiles = if !address_space.is_cgb() && !self.lcdc.bg_enabled {
            let start = usize::from(line) * SCREEN_WIDTH;
            self.frame_buffer[start..start + SCREEN_WIDTH].fill(BLANK_COLOR);
            false
        } else {
            self.draw_background_line(address_space, window_left, 0)
        };

        self.draw_sprites_line(address_space);

        if skipped_tiles {
            self.draw_background_line(address_space, window_left, PRIORITY_BIT);
        }

        if window_left < SCREEN_WIDTH_I32 {
            self.window_line = self.window_line.wrapping_add(1);
        }
    }

    // Returns whether any tile was skipped because its priority didn't match this pass
    fn draw_background_line(
        &mut self,
        address_space: &AddressSpace,
        window_left: i32,
        priority: u8,
    ) -> bool {
        let line = usize::from(self.scanline);
        let is_cgb = address_space.is_cgb();
        let vram = [address_space.vram(0), address_space.vram(1)];
        let mut skipped_tiles = false;

        let scy = address_space.io(IoRegister::SCY);
        let scx = address_space.io(IoRegister::SCX);
        let source_y = usize::from(self.scanline.wrapping_add(scy));
        let map_base = if self.lcdc.bg_tile_map_high { HIGH_TILE_MAP } else { LOW_TILE_MAP }
            + ((source_y & 0xF8) << 2);

        let mut tile_x = usize::from(scx >> 3);
        let mut screen_x = -i32::from(scx & 0x07);
        while screen_x < window_left {
            let map_address = map_base + (tile_x & 0x1F);
            match self.map_entry(vram, map_address, is_cgb, priority) {
                Some((tile, attributes)) => {
                    self.draw_tile_row(vram, tile, attributes, screen_x, line, source_y & 0x07);
                }
                None => {
                    skipped_tiles = true;
                }
            }

            tile_x += 1;
            screen_x += 8;
        }

        if window_left < SCREEN_WIDTH_I32 {
            let window_map =
                if self.lcdc.window_tile_map_high { HIGH_TILE_MAP } else { LOW_TILE_MAP };
            let mut map_address = window_map + usize::from(self.window_line >> 3) * 0x20;
            let source_line = usize::from(self.window_line & 0x07);

            let mut screen_x = window_left;
            while screen_x < SCREEN_WIDTH_I32 {
                match self.map_entry(vram, map_address & VRAM_MASK, is_cgb, priority) {
                    Some((tile, attributes)) => {
                        self.draw_tile_row(vram, tile, attributes, screen_x, line, source_line);
                    }
                    None => {
                        skipped_tiles = true;
                    }
                }

                map_address += 1;
                screen_x += 8;
            }
        }

        skipped_tiles
    }

    // Resolve a tile map entry to (tile index, cache attributes), or None if the entry belongs to
    // the other priority pass
    fn map_entry(
        &self,
        vram: [&[u8]; 2],
        map_address: usize,
        is_cgb: bool,
        priority: u8,
    ) -> Option<(usize, usize)> {
        let tile_number = vram[0][map_address];
        let mut tile = if self.lcdc.unsigned_tile_data {
            usize::from(tile_number)
        } else if tile_number > 0x7F {
            usize::from(tile_number & 0x7F) + 0x80
        } else {
            usize::from(tile_number) + 0x100
        };

        let mut attributes = 0;
        if is_cgb {
            let map_attributes = vram[1][map_address];
            if map_attributes & PRIORITY_BIT != priority {
                return None;
            }

            attributes = (usize::from(map_attributes & 0x07) << 2)
                + usize::from((map_attributes >> 5) & 0x03);
            tile += TILES_PER_BANK * usize::from((map_attributes >> 3) & 0x01);
        }

        Some((tile, attributes))
    }

    fn draw_tile_row(
        &mut self,
        vram: [&[u8]; 2],
        tile: usize,
        attributes: usize,
        x: i32,
        line: usize,
        source_line: usize,
    ) {
        let palette = self.palettes.active_palette();
        if let Some(pixels) = self.tile_cache.get_or_decode(tile, attributes, vram, palette) {
            blit_row(&mut self.frame_buffer, pixels, x, line, source_line, Blend::Replace);
        }
    }

    fn draw_sprites_line(&mut self, address_space: &AddressSpace) {
        if !self.lcdc.sprites_enabled {
            return;
        }

        let is_cgb = address_space.is_cgb();
        let vram = [address_space.vram(0), address_space.vram(1)];
        let line = i32::from(self.scanline);
        let tall = self.lcdc.tall_sprites;
        let height = if tall { 16 } else { 8 };

        // Behind-background sprites first so that the rest can draw over them
        let passes: &[Option<u8>] = if self.lcdc.sprite_priority_enabled {
            &[Some(PRIORITY_BIT), Some(0)]
        } else {
            &[None]
        };

        for &pass in passes {
            let blend =
                if pass == Some(PRIORITY_BIT) { Blend::BehindBackground } else { Blend::Sprite };

            // Lower OAM indices win, so draw from the end of the table
            for entry in address_space.oam().chunks_exact(OAM_ENTRY_LEN).rev() {
                let &[y, x, tile_number, oam_attributes] = entry else { continue };

                if matches!(pass, Some(priority) if oam_attributes & PRIORITY_BIT != priority) {
                    continue;
                }

                let sprite_x = i32::from(x) - 8;
                let sprite_y = i32::from(y) - 16;
                let offset = line - sprite_y;
                if sprite_x >= SCREEN_WIDTH_I32 || !(0..height).contains(&offset) {
                    continue;
                }

                let mut tile = usize::from(tile_number);
                if tall {
                    tile &= 0xFE;
                }

                // Flip bits move from 0x20/0x40 to 0x01/0x02
                let mut attributes = usize::from((oam_attributes >> 5) & 0x03);
                if is_cgb {
                    attributes += 0x20 + (usize::from(oam_attributes & 0x07) << 2);
                    tile += TILES_PER_BANK * usize::from((oam_attributes >> 3) & 0x01);
                } else {
                    attributes += 0x04 + usize::from((oam_attributes & 0x10) >> 2);
                }

                let offset = offset as usize;
                let (tile, source_line) = if !tall {
                    (tile, offset)
                } else if attributes & 0x02 != 0 {
                    ((tile | 1) - (offset >> 3), offset & 0x07)
                } else {
                    ((tile & !1) + (offset >> 3), offset & 0x07)
                };

                let palette = self.palettes.active_palette();
                if let Some(pixels) = self.tile_cache.get_or_decode(tile, attributes, vram, palette)
                {
                    blit_row(
                        &mut self.frame_buffer,
                        pixels,
                        sprite_x,
                        line as usize,
                        source_line,
                        blend,
                    );
                }
            }
        }
    }
}
