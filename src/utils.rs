use std::io::{Error, ErrorKind, Read, Result};

/// Read until `buf` is full or the stream ends, return the count of bytes
/// readed.
#[inline]
pub fn read_up_to<R>(r: &mut R, buf: &mut [u8]) -> Result<usize>
where
    R: Read + ?Sized,
{
    let mut cnt = 0;
    while cnt < buf.len() {
        match r.read(&mut buf[cnt..]) {
            Ok(0) => break,
            Ok(n) => cnt += n,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(cnt)
}

/// Read exact buf.len() bytes or reads an EOF, return the count of bytes
/// readed.
///
/// Returns `Ok(0)` only on a clean EOF before the first byte.
#[inline]
pub fn read_exact_or_eof<R>(r: &mut R, buf: &mut [u8]) -> Result<usize>
where
    R: Read + ?Sized,
{
    let cnt = read_up_to(r, buf)?;
    if cnt != 0 && cnt != buf.len() {
        Err(Error::new(
            ErrorKind::UnexpectedEof,
            "failed to fill whole buffer",
        ))
    } else {
        Ok(cnt)
    }
}
