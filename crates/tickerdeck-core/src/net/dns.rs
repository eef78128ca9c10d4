//! Captive DNS: answer every A query with the access point's own address.

use thiserror_no_std::Error;

/// TTL of synthesised answers, in seconds.
pub const ANSWER_TTL_SECS: u32 = 60;

const HEADER_LEN: usize = 12;
const ANSWER_LEN: usize = 16;
const TYPE_A: u16 = 1;
const TYPE_ANY: u16 = 255;
const CLASS_IN: u16 = 1;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsError {
    #[error("packet too short")]
    TooShort,
    #[error("not a standard query")]
    NotAQuery,
    #[error("no question")]
    NoQuestion,
    #[error("malformed question name")]
    BadName,
    #[error("response buffer too small")]
    BufferTooSmall,
}

/// Build the reply to `query` in `out`, returning its length.
///
/// The first question is echoed back; A and ANY questions in class IN get a
/// single answer pointing at `addr`, other types get an empty answer section.
pub fn captive_reply(query: &[u8], addr: [u8; 4], out: &mut [u8]) -> Result<usize, DnsError> {
    if query.len() < HEADER_LEN {
        return Err(DnsError::TooShort);
    }
    let flags = u16::from_be_bytes([query[2], query[3]]);
    let is_response = flags & 0x8000 != 0;
    let opcode = (flags >> 11) & 0x0F;
    if is_response || opcode != 0 {
        return Err(DnsError::NotAQuery);
    }
    if u16::from_be_bytes([query[4], query[5]]) == 0 {
        return Err(DnsError::NoQuestion);
    }

    let question_end = question_end(query)?;
    let qtype = u16::from_be_bytes([query[question_end - 4], query[question_end - 3]]);
    let qclass = u16::from_be_bytes([query[question_end - 2], query[question_end - 1]]);
    let answer = (qtype == TYPE_A || qtype == TYPE_ANY) && qclass == CLASS_IN;

    let len = question_end + if answer { ANSWER_LEN } else { 0 };
    if out.len() < len {
        return Err(DnsError::BufferTooSmall);
    }

    out[0..2].copy_from_slice(&query[0..2]);
    // QR + AA + RA, recursion-desired echoed
    let reply_flags = 0x8480 | (flags & 0x0100);
    out[2..4].copy_from_slice(&reply_flags.to_be_bytes());
    out[4..6].copy_from_slice(&1u16.to_be_bytes());
    out[6..8].copy_from_slice(&u16::from(answer).to_be_bytes());
    out[8..12].fill(0);
    out[HEADER_LEN..question_end].copy_from_slice(&query[HEADER_LEN..question_end]);

    if answer {
        let a = &mut out[question_end..len];
        a[0..2].copy_from_slice(&[0xC0, HEADER_LEN as u8]);
        a[2..4].copy_from_slice(&TYPE_A.to_be_bytes());
        a[4..6].copy_from_slice(&CLASS_IN.to_be_bytes());
        a[6..10].copy_from_slice(&ANSWER_TTL_SECS.to_be_bytes());
        a[10..12].copy_from_slice(&4u16.to_be_bytes());
        a[12..16].copy_from_slice(&addr);
    }

    Ok(len)
}

/// End offset of the first question (name, type and class).
fn question_end(packet: &[u8]) -> Result<usize, DnsError> {
    let mut pos = HEADER_LEN;
    loop {
        let len = *packet.get(pos).ok_or(DnsError::TooShort)? as usize;
        if len == 0 {
            pos += 1;
            break;
        }
        // Compression pointers never appear in a query's first name
        if len & 0xC0 != 0 {
            return Err(DnsError::BadName);
        }
        pos += 1 + len;
    }
    let end = pos + 4;
    if end > packet.len() {
        return Err(DnsError::TooShort);
    }
    Ok(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AP: [u8; 4] = [192, 168, 4, 1];

    fn query(name: &[&str], qtype: u16) -> alloc::vec::Vec<u8> {
        let mut q = alloc::vec![0x12, 0x34, 0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0];
        for label in name {
            q.push(label.len() as u8);
            q.extend_from_slice(label.as_bytes());
        }
        q.push(0);
        q.extend_from_slice(&qtype.to_be_bytes());
        q.extend_from_slice(&CLASS_IN.to_be_bytes());
        q
    }

    #[test]
    fn test_a_query_resolves_to_access_point() {
        let q = query(&["connectivitycheck", "gstatic", "com"], TYPE_A);
        let mut out = [0u8; 512];
        let len = captive_reply(&q, AP, &mut out).unwrap();
        let r = &out[..len];

        assert_eq!(len, q.len() + ANSWER_LEN);
        assert_eq!(r[0..2], [0x12, 0x34]);
        assert_eq!(r[2] & 0x80, 0x80, "QR bit");
        assert_eq!(r[2] & 0x01, 0x01, "RD echoed");
        assert_eq!(r[6..8], [0, 1], "one answer");
        assert_eq!(r[12..q.len()], q[12..]);
        assert_eq!(r[len - 4..], AP);
        assert_eq!(r[len - 10..len - 6], ANSWER_TTL_SECS.to_be_bytes());
    }

    #[test]
    fn test_aaaa_query_gets_empty_answer() {
        let q = query(&["example", "com"], 28);
        let mut out = [0u8; 512];
        let len = captive_reply(&q, AP, &mut out).unwrap();
        assert_eq!(len, q.len());
        assert_eq!(out[6..8], [0, 0]);
    }

    #[test]
    fn test_ignores_responses_and_garbage() {
        let mut q = query(&["a"], TYPE_A);
        q[2] |= 0x80;
        let mut out = [0u8; 512];
        assert_eq!(captive_reply(&q, AP, &mut out), Err(DnsError::NotAQuery));
        assert_eq!(captive_reply(&[0; 5], AP, &mut out), Err(DnsError::TooShort));

        let truncated = query(&["example", "com"], TYPE_A);
        assert_eq!(
            captive_reply(&truncated[..truncated.len() - 3], AP, &mut out),
            Err(DnsError::TooShort)
        );

        let mut no_question = query(&["a"], TYPE_A);
        no_question[5] = 0;
        assert_eq!(captive_reply(&no_question, AP, &mut out), Err(DnsError::NoQuestion));
    }

    #[test]
    fn test_small_buffer() {
        let q = query(&["a"], TYPE_A);
        let mut out = [0u8; 20];
        assert_eq!(captive_reply(&q, AP, &mut out), Err(DnsError::BufferTooSmall));
    }
}
