//! C3 (open-world half): a chunked voxel world (§3, §4.3). Chunks are `W x H x D`
//! (16x256x16) of 16-bit block ids plus nibble-packed block/sky light, a
//! byte-per-column biome index, and a byte-per-column height map. Chunks are produced
//! lazily by an injected generator and memoized by chunk coordinate.
//!
//! Terrain procedural generation (biomes, caves, structures) is explicitly out of
//! scope (§1 Non-goals): it is treated as a deterministic pure function
//! `Generate(seed, chunkX, chunkZ) -> Chunk` behind the [`ChunkGenerator`] trait. The
//! [`FlatGenerator`] here is a minimal stand-in satisfying that contract for tests and
//! for modes that don't need real terrain variety.

use std::collections::HashMap;

pub const CHUNK_W: usize = 16;
pub const CHUNK_H: usize = 256;
pub const CHUNK_D: usize = 16;

pub const AIR: u16 = 0;

#[derive(Debug, Clone)]
pub struct Chunk {
    pub blocks: Vec<u16>,
    /// Nibble-packed: two 4-bit values per byte (block light, sky light).
    pub light: Vec<u8>,
    pub biome: Vec<u8>,
    pub height_map: Vec<u8>,
    pub dirty: bool,
}

impl Chunk {
    pub fn empty() -> Self {
        Chunk {
            blocks: vec![AIR; CHUNK_W * CHUNK_H * CHUNK_D],
            light: vec![0u8; (CHUNK_W * CHUNK_H * CHUNK_D) / 2],
            biome: vec![0u8; CHUNK_W * CHUNK_D],
            height_map: vec![0u8; CHUNK_W * CHUNK_D],
            dirty: false,
        }
    }

    fn flat_index(lx: usize, ly: usize, lz: usize) -> usize {
        (ly * CHUNK_D + lz) * CHUNK_W + lx
    }

    fn column_index(lx: usize, lz: usize) -> usize {
        lz * CHUNK_W + lx
    }

    pub fn get_block(&self, lx: usize, ly: usize, lz: usize) -> u16 {
        self.blocks[Self::flat_index(lx, ly, lz)]
    }

    pub fn set_block(&mut self, lx: usize, ly: usize, lz: usize, id: u16) {
        self.blocks[Self::flat_index(lx, ly, lz)] = id;
        self.dirty = true;
        self.recompute_height_column(lx, lz);
    }

    /// Incremental height-map update (§4.3): a block rising bumps the max; a block
    /// removed at the max rescans downward.
    fn recompute_height_column(&mut self, lx: usize, lz: usize) {
        let col = Self::column_index(lx, lz);
        let current_top = self.height_map[col] as usize;
        let mut top = current_top;
        loop {
            if top == 0 {
                break;
            }
            if self.get_block(lx, top - 1, lz) != AIR {
                break;
            }
            top -= 1;
        }
        // Rising: if we just placed a block above the recorded top, bump it.
        for y in (top..CHUNK_H).rev() {
            if self.get_block(lx, y, lz) != AIR {
                top = y + 1;
                break;
            }
        }
        self.height_map[col] = top.min(255) as u8;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cz: i32,
}

/// `Generate(seed, chunkX, chunkZ) -> Chunk`: a deterministic pure function (§1, §4.3).
pub trait ChunkGenerator: Send + Sync {
    fn generate(&self, seed: u32, coord: ChunkCoord) -> Chunk;
}

/// Minimal stand-in generator: a flat world at a fixed height, deterministic in the
/// seed only through the biome id. Real terrain generation is an out-of-scope
/// external collaborator (§1).
pub struct FlatGenerator {
    pub surface_height: usize,
    pub surface_block: u16,
    pub subsurface_block: u16,
}

impl ChunkGenerator for FlatGenerator {
    fn generate(&self, _seed: u32, _coord: ChunkCoord) -> Chunk {
        let mut chunk = Chunk::empty();
        for lz in 0..CHUNK_D {
            for lx in 0..CHUNK_W {
                for ly in 0..self.surface_height {
                    let id = if ly + 1 == self.surface_height {
                        self.surface_block
                    } else {
                        self.subsurface_block
                    };
                    chunk.blocks[Chunk::flat_index(lx, ly, lz)] = id;
                }
                chunk.height_map[Chunk::column_index(lx, lz)] = self.surface_height as u8;
            }
        }
        chunk
    }
}

pub struct ChunkedWorld {
    seed: u32,
    generator: Box<dyn ChunkGenerator>,
    chunks: HashMap<ChunkCoord, Chunk>,
}

impl ChunkedWorld {
    pub fn new(seed: u32, generator: Box<dyn ChunkGenerator>) -> Self {
        ChunkedWorld { seed, generator, chunks: HashMap::new() }
    }

    fn split(x: i32, z: i32) -> (ChunkCoord, usize, usize) {
        let cx = x.div_euclid(CHUNK_W as i32);
        let cz = z.div_euclid(CHUNK_D as i32);
        let lx = x.rem_euclid(CHUNK_W as i32) as usize;
        let lz = z.rem_euclid(CHUNK_D as i32) as usize;
        (ChunkCoord { cx, cz }, lx, lz)
    }

    fn chunk_or_generate(&mut self, coord: ChunkCoord) -> &mut Chunk {
        self.chunks
            .entry(coord)
            .or_insert_with(|| self.generator.generate(self.seed, coord))
    }

    /// Resolves chunk, local coordinate, flat index; returns air for out-of-bounds Y.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> u16 {
        if y < 0 || y as usize >= CHUNK_H {
            return AIR;
        }
        let (coord, lx, lz) = Self::split(x, z);
        match self.chunks.get(&coord) {
            Some(chunk) => chunk.get_block(lx, y as usize, lz),
            None => AIR,
        }
    }

    /// Lazily creates the chunk through the generator, marks it dirty, updates the
    /// column height map incrementally (§4.3).
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, id: u16) {
        if y < 0 || y as usize >= CHUNK_H {
            return;
        }
        let (coord, lx, lz) = Self::split(x, z);
        let chunk = self.chunk_or_generate(coord);
        chunk.set_block(lx, y as usize, lz, id);
    }

    pub fn height_at(&mut self, x: i32, z: i32) -> usize {
        let (coord, lx, lz) = Self::split(x, z);
        let chunk = self.chunk_or_generate(coord);
        chunk.height_map[Chunk::column_index(lx, lz)] as usize
    }

    fn is_solid_non_liquid(&self, id: u16, liquid_ids: &[u16]) -> bool {
        id != AIR && !liquid_ids.contains(&id)
    }

    /// Spirals outward from world center, returning the first column where the top
    /// block is solid non-liquid with two air blocks above (§4.3).
    pub fn find_spawn_point(&mut self, center_x: i32, center_z: i32, liquid_ids: &[u16]) -> (i32, i32, i32) {
        let mut x = center_x;
        let mut z = center_z;
        let mut dx = 0i32;
        let mut dz = -1i32;
        let max_steps = 4096;
        for _ in 0..max_steps {
            let top = self.height_at(x, z);
            if top > 0 && top + 1 < CHUNK_H {
                let top_block = self.get_block(x, top as i32 - 1, z);
                if self.is_solid_non_liquid(top_block, liquid_ids)
                    && self.get_block(x, top as i32, z) == AIR
                    && self.get_block(x, top as i32 + 1, z) == AIR
                {
                    return (x, top as i32, z);
                }
            }
            // Standard square-spiral step: turn whenever we hit a corner of the
            // growing ring.
            if x == z && x >= center_x || (x - center_x == -(z - center_z) && z - center_z > 0) {
                let tmp = dx;
                dx = -dz;
                dz = tmp;
            }
            x += dx;
            z += dz;
        }
        (center_x, self.height_at(center_x, center_z) as i32, center_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> ChunkedWorld {
        ChunkedWorld::new(
            1,
            Box::new(FlatGenerator { surface_height: 64, surface_block: 2, subsurface_block: 1 }),
        )
    }

    #[test]
    fn set_then_get_round_trips_across_chunk_boundary() {
        let mut w = world();
        w.set_block(20, 70, -5, 99);
        assert_eq!(w.get_block(20, 70, -5), 99);
    }

    #[test]
    fn out_of_bounds_y_returns_air() {
        let w = world();
        assert_eq!(w.get_block(0, -1, 0), AIR);
        assert_eq!(w.get_block(0, 1000, 0), AIR);
    }

    #[test]
    fn height_map_updates_on_rise_and_removal() {
        let mut w = world();
        assert_eq!(w.height_at(0, 0), 64);
        w.set_block(0, 64, 0, 5);
        assert_eq!(w.height_at(0, 0), 65);
        w.set_block(0, 64, 0, AIR);
        assert_eq!(w.height_at(0, 0), 64);
    }

    #[test]
    fn find_spawn_point_lands_on_solid_ground_with_headroom() {
        let mut w = world();
        let (x, y, z) = w.find_spawn_point(0, 0, &[]);
        assert_eq!(y, 64);
        assert_eq!(w.get_block(x, y - 1, z), 2);
        assert_eq!(w.get_block(x, y, z), AIR);
        assert_eq!(w.get_block(x, y + 1, z), AIR);
    }
}
