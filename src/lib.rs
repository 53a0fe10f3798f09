/*!
Rsync-style delta encoding over plain byte streams.

The side holding the old version (the *basis*) builds a compact
[`Signature`] of it. The side holding the new version scans it against the
signature and produces a [`Delta`]: ranges reusable from the basis plus
literal bytes. The delta is then replayed against the basis to reconstruct
the new version.

```
use std::io;
use rsdelta::{Delta, Signature};

fn sync(basis: &[u8], new: &[u8]) -> rsdelta::Result<Vec<u8>> {
    let mut sig = Vec::new();
    Signature::new(basis, 32)?.write(&mut sig)?;

    let sig = Signature::read(&sig[..])?;
    let mut delta = Vec::new();
    Delta::new(new, &sig)?.write(&mut delta)?;

    let delta = Delta::read(&delta[..])?;
    let mut out = Vec::new();
    delta.patch(io::Cursor::new(basis), &mut out)?;
    Ok(out)
}
```
*/

mod codec;
mod error;
mod utils;

pub mod rollsum;
pub mod rsdiff;
pub mod rspatch;
pub mod signature;
pub mod strong;

pub use codec::{TAG_LITERAL, TAG_REUSABLE};
pub use error::{Error, Result};
pub use rollsum::RollingChecksum;
pub use rsdiff::{Chunk, Delta, Rsdiff};
pub use rspatch::Rspatch;
pub use signature::{BlockSum, Signature, DEFAULT_BLOCK_LENGTH, MIN_BLOCK_LENGTH};
pub use strong::{strong_hash, StrongHash, STRONG_HASH_SIZE};
