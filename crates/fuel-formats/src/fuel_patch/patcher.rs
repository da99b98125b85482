//! FUEL_PATCH application engine
//!
//! The patcher streams all three files: the source is read through seeks
//! and bounded block reads, the patch is consumed once from the front, and
//! the target is only appended to. Memory use is bounded by the block size.

use crate::fuel_patch::{
    PatchCompression,
    error::{FuelPatchError, FuelPatchResult},
    instruction::{Instruction, read_full},
};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use tracing::{debug, trace};

/// Default block size for Copy, Insert and Merge transfers (1 MiB)
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

/// Apply a FUEL_PATCH to in-memory source data
///
/// # Examples
///
/// ```rust
/// use fuel_formats::fuel_patch::{self, FuelPatchWriter, PatchCompression};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut writer = FuelPatchWriter::new(PatchCompression::None);
/// writer.copy(6)?.insert(b"Rust!")?;
/// let patch = writer.finish()?;
///
/// let result = fuel_patch::apply_patch_memory(b"Hello World!", &patch)?;
/// assert_eq!(result, b"Hello Rust!");
/// # Ok(())
/// # }
/// ```
pub fn apply_patch_memory(source: &[u8], patch: &[u8]) -> FuelPatchResult<Vec<u8>> {
    let mut target = Vec::with_capacity(source.len());
    FuelPatcher::new(Cursor::new(source), patch, &mut target).apply()?;
    Ok(target)
}

/// Streaming FUEL_PATCH patcher
///
/// # Examples
///
/// ```rust,no_run
/// use std::fs::File;
/// use std::io::BufWriter;
/// use fuel_formats::fuel_patch::FuelPatcher;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let source = File::open("data/a.bin")?;
/// let patch = File::open("data/a.bin.patch")?;
/// let target = BufWriter::new(File::create("data/a.bin.new")?);
///
/// let written = FuelPatcher::new(source, patch, target).apply()?;
/// println!("wrote {written} bytes");
/// # Ok(())
/// # }
/// ```
pub struct FuelPatcher<S, P, T> {
    source: S,
    patch: P,
    target: T,
    block_size: usize,
}

impl<S: Read + Seek, P: Read, T: Write> FuelPatcher<S, P, T> {
    /// Create a patcher over the three streams
    pub fn new(source: S, patch: P, target: T) -> Self {
        Self {
            source,
            patch,
            target,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Set the transfer block size (default: 1 MiB)
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Run the patch to completion, returning the number of bytes written
    ///
    /// Stops at the first error; whatever was already written to the target
    /// stays there.
    pub fn apply(self) -> FuelPatchResult<u64> {
        let Self {
            mut source,
            mut patch,
            mut target,
            block_size,
        } = self;

        let mut flag = [0u8; 1];
        if read_full(&mut patch, &mut flag)? == 0 {
            return Err(FuelPatchError::InvalidCompression(None));
        }
        let compression = PatchCompression::try_from(flag[0])?;

        let mut engine = Engine::new(block_size);
        let written = match compression {
            PatchCompression::None => {
                debug!("Delta patch is not compressed");
                engine.run(&mut source, &mut patch, &mut target)?
            }
            PatchCompression::Zstd => {
                debug!("Delta patch is zstd compressed");
                let mut decoder = zstd::stream::read::Decoder::new(patch)?;
                engine.run(&mut source, &mut decoder, &mut target)?
            }
        };

        target.flush()?;
        debug!(
            bytes_written = written,
            instructions = engine.instructions,
            "Delta patch applied"
        );
        Ok(written)
    }
}

/// Instruction interpreter with reusable block buffers
struct Engine {
    block_size: usize,
    source_buf: Vec<u8>,
    patch_buf: Vec<u8>,
    instructions: u64,
}

impl Engine {
    fn new(block_size: usize) -> Self {
        Self {
            block_size,
            source_buf: Vec::new(),
            patch_buf: Vec::new(),
            instructions: 0,
        }
    }

    fn run<S, P, T>(
        &mut self,
        source: &mut S,
        patch: &mut P,
        target: &mut T,
    ) -> FuelPatchResult<u64>
    where
        S: Read + Seek,
        P: Read,
        T: Write,
    {
        let mut written = 0u64;
        while let Some(instruction) = Instruction::read_from(patch)? {
            trace!(?instruction, "FUEL_PATCH instruction");
            self.instructions += 1;
            match instruction {
                Instruction::Seek(offset) => {
                    source.seek(SeekFrom::Current(offset))?;
                }
                Instruction::Copy(length) => {
                    self.transfer(source, target, length, "copy", "source")?;
                    written += length;
                }
                Instruction::Insert(length) => {
                    self.transfer(patch, target, length, "insert", "patch")?;
                    written += length;
                }
                Instruction::Merge(length) => {
                    self.merge(source, patch, target, length)?;
                    written += length;
                }
            }
        }
        Ok(written)
    }

    fn block(&self, remaining: u64) -> usize {
        usize::try_from(remaining).map_or(self.block_size, |r| r.min(self.block_size))
    }

    fn transfer<R: Read + ?Sized, T: Write>(
        &mut self,
        reader: &mut R,
        target: &mut T,
        length: u64,
        opcode: &'static str,
        stream: &'static str,
    ) -> FuelPatchResult<()> {
        let mut remaining = length;
        while remaining > 0 {
            let chunk = self.block(remaining);
            if self.source_buf.len() < chunk {
                self.source_buf.resize(chunk, 0);
            }
            let buf = &mut self.source_buf[..chunk];
            let got = read_full(reader, buf)?;
            target.write_all(&buf[..got])?;
            if got < chunk {
                return Err(FuelPatchError::unexpected_eof(
                    opcode,
                    stream,
                    remaining - got as u64,
                ));
            }
            remaining -= chunk as u64;
        }
        Ok(())
    }

    fn merge<S: Read, P: Read, T: Write>(
        &mut self,
        source: &mut S,
        patch: &mut P,
        target: &mut T,
        length: u64,
    ) -> FuelPatchResult<()> {
        let mut remaining = length;
        while remaining > 0 {
            let chunk = self.block(remaining);
            if self.source_buf.len() < chunk {
                self.source_buf.resize(chunk, 0);
            }
            if self.patch_buf.len() < chunk {
                self.patch_buf.resize(chunk, 0);
            }

            let source_len = read_full(source, &mut self.source_buf[..chunk])?;
            let patch_len = read_full(patch, &mut self.patch_buf[..chunk])?;
            if source_len != chunk || patch_len != chunk {
                return Err(FuelPatchError::MergeLengthMismatch {
                    expected: chunk,
                    source_len,
                    patch_len,
                });
            }

            for (s, p) in self.source_buf[..chunk]
                .iter_mut()
                .zip(&self.patch_buf[..chunk])
            {
                *s = s.wrapping_add(*p);
            }
            target.write_all(&self.source_buf[..chunk])?;
            remaining -= chunk as u64;
        }
        Ok(())
    }
}
