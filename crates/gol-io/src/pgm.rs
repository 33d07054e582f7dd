use std::io::{Read, Write};
use std::path::PathBuf;

use gol_core::World;

/// Abstract boundary to the on-disk PGM collaborator (spec.md §6). The core
/// never parses PGM directly; it exchanges raw bytes through this trait.
pub trait ImageIo {
    fn read_pgm(&self, width: u32, height: u32) -> anyhow::Result<World>;
    fn write_pgm(&self, filename: &str, world: &World) -> anyhow::Result<()>;
}

/// Binary PGM (P5) files on disk, named `WxH` on input and `WxHxT` on
/// output as specified.
pub struct FilePgmIo {
    dir: PathBuf,
}

impl FilePgmIo {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn input_filename(width: u32, height: u32) -> String {
        format!("{width}x{height}")
    }

    pub fn output_filename(width: u32, height: u32, turn: u32) -> String {
        format!("{width}x{height}x{turn}")
    }
}

impl ImageIo for FilePgmIo {
    fn read_pgm(&self, width: u32, height: u32) -> anyhow::Result<World> {
        let path = self.dir.join(Self::input_filename(width, height));
        let mut file = std::fs::File::open(&path)
            .map_err(|e| anyhow::anyhow!("failed to open {}: {e}", path.display()))?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        decode_pgm(&contents, width, height)
    }

    fn write_pgm(&self, filename: &str, world: &World) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        let mut file = std::fs::File::create(&path)
            .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", path.display()))?;
        file.write_all(&encode_pgm(world))?;
        Ok(())
    }
}

fn encode_pgm(world: &World) -> Vec<u8> {
    let mut out = format!("P5\n{} {}\n255\n", world.width(), world.height()).into_bytes();
    for row in world.rows() {
        out.extend_from_slice(row);
    }
    out
}

fn decode_pgm(bytes: &[u8], expected_width: u32, expected_height: u32) -> anyhow::Result<World> {
    // Minimal P5 parser: magic, then whitespace-separated width/height/maxval,
    // a single whitespace byte, then raw samples.
    let mut pos = 0usize;
    let magic = take_token(bytes, &mut pos)?;
    anyhow::ensure!(magic == "P5", "not a binary PGM file (expected P5, got {magic})");
    let width: u32 = take_token(bytes, &mut pos)?.parse()?;
    let height: u32 = take_token(bytes, &mut pos)?.parse()?;
    let _maxval: u32 = take_token(bytes, &mut pos)?.parse()?;
    pos += 1; // single whitespace byte separating header from raster
    anyhow::ensure!(
        width == expected_width && height == expected_height,
        "pgm dimensions {width}x{height} do not match requested {expected_width}x{expected_height}"
    );
    let expected_len = (width as usize) * (height as usize);
    anyhow::ensure!(
        bytes.len() >= pos + expected_len,
        "pgm file truncated: expected {expected_len} raster bytes"
    );
    let mut rows = Vec::with_capacity(height as usize);
    for y in 0..height as usize {
        let start = pos + y * width as usize;
        rows.push(bytes[start..start + width as usize].to_vec());
    }
    World::from_rows(rows).map_err(Into::into)
}

fn take_token(bytes: &[u8], pos: &mut usize) -> anyhow::Result<String> {
    while *pos < bytes.len() && bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    let start = *pos;
    while *pos < bytes.len() && !bytes[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    anyhow::ensure!(*pos > start, "unexpected end of pgm header");
    Ok(String::from_utf8_lossy(&bytes[start..*pos]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let io = FilePgmIo::new(dir.path());
        let mut rows = vec![vec![0u8; 4]; 4];
        rows[0][0] = 255;
        rows[3][3] = 255;
        let world = World::from_rows(rows).unwrap();

        io.write_pgm(&FilePgmIo::input_filename(4, 4), &world).unwrap();
        let loaded = io.read_pgm(4, 4).unwrap();
        assert_eq!(loaded, world);
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let io = FilePgmIo::new(dir.path());
        let world = World::empty(4, 4);
        io.write_pgm(&FilePgmIo::input_filename(4, 4), &world).unwrap();
        assert!(io.read_pgm(5, 5).is_err());
    }
}
