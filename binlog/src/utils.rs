#![allow(dead_code)]

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use nom::{
    bytes::complete::{take, take_till},
    combinator::map,
    number::complete::{le_u16, le_u32, le_u64, le_u8},
    IResult,
};

use common::err::decode_error::ReError;
use common::err::CResult;

/// extract n(n <= len(input)) bytes string
/// 实现思路：
/// 由于可能存在多个终止符，首先需要找到第一个终止符位置，然后使用 String::from_utf8_lossy 将之前的字符转换为字符串。
pub fn extract_string(input: &[u8]) -> String {
    let null_end = input
        .iter()
        .position(|&c| c == b'\0')
        .unwrap_or(input.len());
    String::from_utf8_lossy(&input[0..null_end]).to_string()
}

/// parse fixed len int
///
/// ref: https://dev.mysql.com/doc/internals/en/integer.html#fixed-length-integer
pub fn int_fixed<'a>(input: &'a [u8], len: u8) -> IResult<&'a [u8], u64> {
    match len {
        1 => map(le_u8, |v| v as u64)(input),
        2 => map(le_u16, |v| v as u64)(input),
        3 | 6 => map(take(3usize), |s: &[u8]| {
            let mut filled = s.to_vec();
            if len == 3 {
                filled.extend(vec![0, 0, 0, 0, 0]);
            } else {
                filled.extend(vec![0, 0]);
            }
            pu64(&filled).unwrap().1
        })(input),
        4 => map(le_u32, |v| v as u64)(input),
        8 => le_u64(input),
        _ => unreachable!(),
    }
}

/// parse len encoded int, return (used_bytes, value).
///
/// ref: https://dev.mysql.com/doc/internals/en/integer.html#packet-Protocol::LengthEncodedInteger
pub fn int_by_length_encoded<'a>(input: &'a [u8]) -> IResult<&'a [u8], (usize, u64)> {
    match input[0] {
        // 0 -- 250
        0..=0xfa => map(le_u8, |num: u8| (1, num as u64))(input),
        // 251， 252
        0xfb | 0xfc => {
            let (i, lead) = take(1usize)(input)?;
            map(le_u16, |num: u16| (3, num as u64))(i)
        }
        // 253
        0xfd => {
            let (i, lead) = take(1usize)(input)?;
            let (i, v) = map(take(3usize), |s: &[u8]| {
                let mut raw = s.to_vec();
                raw.push(0);
                raw
            })(i)?;
            let (_, num) = pu32(&v).unwrap();
            Ok((i, (4, num as u64)))
        }
        // 254
        0xfe => {
            let (i, _) = take(1usize)(input)?;
            map(le_u64, |v: u64| (9, v))(i)
        }
        // 255
        0xff => unreachable!(),
    }
}

/// parse length encoded string
///
/// ref: https://dev.mysql.com/doc/internals/en/string.html#packet-Protocol::LengthEncodedString
pub fn string_by_length_encoded<'a>(input: &'a [u8]) -> IResult<&'a [u8], String> {
    let (i, (_, str_len)) = int_by_length_encoded(input)?;
    map(take(str_len), |s: &[u8]| {
        String::from_utf8_lossy(s).to_string()
    })(i)
}

/// parse 'null terminated string', consume null byte
///
/// ref: https://dev.mysql.com/doc/internals/en/string.html#packet-Protocol::NulTerminatedString
pub fn string_by_nul_terminated(input: &[u8]) -> IResult<&[u8], String> {
    let (i, ret) = map(take_till(|c: u8| c == 0x00), |s| {
        String::from_utf8_lossy(s).to_string()
    })(input)?;
    let (i, _) = take(1usize)(i)?;
    Ok((i, ret))
}

/// extract len bytes string
///
/// ref: https://dev.mysql.com/doc/internals/en/string.html#packet-Protocol::VariableLengthString
pub fn string_by_variable_len(input: &[u8], len: usize) -> String {
    if input.len() <= len {
        String::from_utf8_lossy(&input).to_string()
    } else {
        String::from_utf8_lossy(&input[0..len]).to_string()
    }
}

/// 定长编码取值, parse fixed len string。
/// 第一个byte申明长度len，后续len个byte为存储的值
///
/// ref: https://dev.mysql.com/doc/internals/en/string.html#packet-Protocol::FixedLengthString
pub fn string_by_fixed_len(input: &[u8]) -> IResult<&[u8], (u8, String)> {
    let (i, len) = le_u8(input)?;
    map(take(len), move |s: &[u8]| {
        (len, String::from_utf8_lossy(s).to_string())
    })(i)
}

pub fn pu32(input: &[u8]) -> IResult<&[u8], u32> {
    le_u32(input)
}

pub fn pu64(input: &[u8]) -> IResult<&[u8], u64> {
    le_u64(input)
}

/// parse len encoded int out of a `Cursor`, return (used_bytes, value).
///
/// Same wire shape as `int_by_length_encoded`, but for packet readers (the
/// `connection` crate) that consume a handshake/OK packet field-by-field
/// through a `Cursor` rather than slicing the whole buffer with `nom`.
///
/// ref: https://dev.mysql.com/doc/internals/en/integer.html#packet-Protocol::LengthEncodedInteger
pub fn read_len_enc_num(cursor: &mut Cursor<&[u8]>) -> CResult<(u8, u64)> {
    let first = cursor.read_u8()?;
    match first {
        0..=0xfa => Ok((1, first as u64)),
        0xfb => Ok((1, 0)),
        0xfc => Ok((3, cursor.read_u16::<LittleEndian>()? as u64)),
        0xfd => {
            let mut buf = [0u8; 4];
            cursor.read_exact(&mut buf[0..3])?;
            Ok((4, u32::from_le_bytes(buf) as u64))
        }
        0xfe => Ok((9, cursor.read_u64::<LittleEndian>()?)),
        0xff => Err(ReError::String("invalid length-encoded integer prefix 0xff".to_string())),
    }
}

/// alias of `read_len_enc_num` for callers that read a whole packet field-by-field
/// through one shared cursor.
pub fn read_len_enc_num_with_cursor(cursor: &mut Cursor<&[u8]>) -> CResult<(u8, u64)> {
    read_len_enc_num(cursor)
}

/// read a length-encoded string out of a `Cursor`.
///
/// ref: https://dev.mysql.com/doc/internals/en/string.html#packet-Protocol::LengthEncodedString
pub fn read_len_enc_str_with_cursor(cursor: &mut Cursor<&[u8]>) -> CResult<String> {
    let (_, len) = read_len_enc_num(cursor)?;
    let mut buf = vec![0u8; len as usize];
    cursor.read_exact(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).to_string())
}

/// read a length-encoded string out of a `Cursor`, returning `None` when the
/// column value is SQL NULL (length-encoded prefix 0xfb).
///
/// ref: https://dev.mysql.com/doc/internals/en/string.html#packet-ProtocolText::ResultsetRow
pub fn read_len_enc_str_with_cursor_allow_null(cursor: &mut Cursor<&[u8]>) -> CResult<Option<String>> {
    const NULL_MARKER: u8 = 0xfb;
    let pos = cursor.position();
    let marker = cursor.read_u8()?;
    if marker == NULL_MARKER {
        return Ok(None);
    }
    cursor.set_position(pos);
    read_len_enc_str_with_cursor(cursor).map(Some)
}

/// read a NUL-terminated string out of a `Cursor`, consuming the terminator.
///
/// ref: https://dev.mysql.com/doc/internals/en/string.html#packet-Protocol::NulTerminatedString
pub fn read_null_term_string_with_cursor(cursor: &mut Cursor<&[u8]>) -> CResult<String> {
    let mut bytes = Vec::new();
    loop {
        let b = cursor.read_u8()?;
        if b == 0 {
            break;
        }
        bytes.push(b);
    }
    Ok(String::from_utf8_lossy(&bytes).to_string())
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::{read_len_enc_num, read_null_term_string_with_cursor};

    #[test]
    fn test() {
        assert_eq!(1, 1);
    }

    #[test]
    fn len_enc_num_single_byte() {
        let buf = [0x05u8];
        let mut cursor = Cursor::new(&buf[..]);
        let (used, value) = read_len_enc_num(&mut cursor).unwrap();
        assert_eq!((used, value), (1, 5));
    }

    #[test]
    fn null_term_string_stops_at_terminator() {
        let buf = [b'a', b'b', b'c', 0x00, b'd'];
        let mut cursor = Cursor::new(&buf[..]);
        let s = read_null_term_string_with_cursor(&mut cursor).unwrap();
        assert_eq!(s, "abc");
        // remaining bytes are still there, terminator consumed
        assert_eq!(cursor.position(), 4);
    }
}