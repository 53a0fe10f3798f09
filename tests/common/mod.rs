#![allow(unused)]

use chrono::Utc;
use rand::distributions::uniform::{SampleUniform, Uniform};
use rand::prelude::*;
use rand::random;
use rsdelta::{Delta, Rsdiff, Signature};
use std::fs;
use std::io;
use std::path;

/// Signature -> delta -> patch through the binary encodings.
pub fn sync(basis: &[u8], new: &[u8], block_length: u32) -> rsdelta::Result<Vec<u8>> {
    let mut sig = Vec::new();
    Signature::new(basis, block_length)?.write(&mut sig)?;
    let sig = Signature::read(&sig[..])?;

    let mut delta = Vec::new();
    Rsdiff::new(&sig).compare(new)?.write(&mut delta)?;
    let delta = Delta::read(&delta[..])?;

    let mut target = Vec::new();
    delta.patch(io::Cursor::new(basis), &mut target)?;
    Ok(target)
}

/// Delta of `new` against the signature of `basis`.
pub fn delta_of(basis: &[u8], new: &[u8], block_length: u32) -> rsdelta::Result<Delta> {
    let sig = Signature::new(basis, block_length)?;
    Delta::new(new, &sig)
}

pub fn temp_dir() -> io::Result<path::PathBuf> {
    let dir = std::env::temp_dir().join("rsdelta-test");
    fs::create_dir_all(dir.as_path())?;
    Ok(dir)
}

/// Unique path under the test temp directory.
pub fn temp_path() -> io::Result<path::PathBuf> {
    let id = format!("{}-{:x}", Utc::now().format("%s.%f"), random::<u32>());
    Ok(temp_dir()?.join(id))
}

pub fn create_temp<B: AsRef<[u8]>>(bytes: B) -> io::Result<path::PathBuf> {
    let p = temp_path()?;
    fs::write(p.as_path(), bytes)?;
    Ok(p)
}

pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut rng = thread_rng();
    let mut bytes = Vec::with_capacity(n);
    for _ in 0..n {
        bytes.push(rng.gen())
    }
    bytes
}

/// Target of roughly the size of `source`. Each span is copied from a
/// random offset of `source` with probability `similar`, random otherwise,
/// and about one copied span in ten gets a byte flipped.
pub fn distort(source: &[u8], similar: f64) -> Vec<u8> {
    if source.is_empty() {
        return Vec::new();
    }

    let mut rng = thread_rng();
    let similar = if similar.is_nan() { 0.0 } else { similar.clamp(0.0, 1.0) };
    let size = random_between(source.len() * 3 / 4, source.len() * 5 / 4);
    let mut target = Vec::with_capacity(size);
    while target.len() < size {
        if rng.gen_bool(similar) {
            let len = random_between(1, Ord::min(512, source.len()));
            let offset = random_between(0, source.len() - len);
            target.extend_from_slice(&source[offset..offset + len]);
            if rng.gen_bool(0.1) {
                let at = target.len() - random_between(1, len);
                target[at] ^= 0xff;
            }
        } else {
            target.extend(random_bytes(random_between(1, 64)));
        }
    }
    target
}

pub fn random_between<X: SampleUniform>(lo: X, hi: X) -> X {
    let mut rng = thread_rng();
    Uniform::new_inclusive(lo, hi).sample(&mut rng)
}
