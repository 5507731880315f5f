//! Minimal SNMPv2c BER codec.
//!
//! Encodes GetRequest / GetNextRequest / GetBulkRequest messages and
//! decodes Response messages. Only the subset of ASN.1 BER that SNMPv2c
//! actually uses is implemented; unknown tags decode to an opaque hex
//! rendering rather than failing the whole message.

use crate::error::SnmpError;

pub const SNMP_VERSION_2C: i64 = 1;

// PDU tags
pub const TAG_GET_REQUEST: u8 = 0xA0;
pub const TAG_GET_NEXT_REQUEST: u8 = 0xA1;
pub const TAG_RESPONSE: u8 = 0xA2;
pub const TAG_GET_BULK_REQUEST: u8 = 0xA5;

// Universal tags
const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_NULL: u8 = 0x05;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;

// SNMP application tags
const TAG_IP_ADDRESS: u8 = 0x40;
const TAG_COUNTER32: u8 = 0x41;
const TAG_GAUGE32: u8 = 0x42;
const TAG_TIMETICKS: u8 = 0x43;
const TAG_OPAQUE: u8 = 0x44;
const TAG_COUNTER64: u8 = 0x46;

// varbind exception sentinels (context tags in the value position)
const TAG_NO_SUCH_OBJECT: u8 = 0x80;
const TAG_NO_SUCH_INSTANCE: u8 = 0x81;
const TAG_END_OF_MIB_VIEW: u8 = 0x82;

// ── Oid ───────────────────────────────────────────────────────────────────────

/// A dotted object identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid(pub Vec<u64>);

impl Oid {
    pub fn parse(s: &str) -> Result<Self, SnmpError> {
        let arcs: Result<Vec<u64>, _> = s
            .trim()
            .trim_matches('.')
            .split('.')
            .map(|p| p.parse::<u64>())
            .collect();
        match arcs {
            Ok(arcs) if arcs.len() >= 2 => Ok(Oid(arcs)),
            _ => Err(SnmpError::Codec(format!("invalid OID '{s}'"))),
        }
    }

    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|a| a.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

// ── Values ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum SnmpValue {
    Integer(i64),
    OctetString(Vec<u8>),
    Null,
    Oid(Oid),
    IpAddress([u8; 4]),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Counter64(u64),
    Opaque(Vec<u8>),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
}

impl SnmpValue {
    /// True for the exception sentinels that must never reach callers as
    /// data.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            SnmpValue::NoSuchObject | SnmpValue::NoSuchInstance | SnmpValue::EndOfMibView
        )
    }

    /// Human-readable rendering, matching the conventions collectors parse:
    /// integers as decimal, printable octet strings as text, binary octet
    /// strings as `0x…` hex.
    pub fn render(&self) -> String {
        match self {
            SnmpValue::Integer(v) => v.to_string(),
            SnmpValue::OctetString(bytes) | SnmpValue::Opaque(bytes) => {
                let printable = !bytes.is_empty()
                    && bytes
                        .iter()
                        .all(|b| (0x20..0x7f).contains(b) || matches!(b, b'\n' | b'\r' | b'\t'));
                if printable {
                    String::from_utf8_lossy(bytes).to_string()
                } else {
                    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
                    format!("0x{hex}")
                }
            }
            SnmpValue::Null => String::new(),
            SnmpValue::Oid(oid) => oid.to_string(),
            SnmpValue::IpAddress(octets) => {
                format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
            }
            SnmpValue::Counter32(v) | SnmpValue::Gauge32(v) | SnmpValue::TimeTicks(v) => {
                v.to_string()
            }
            SnmpValue::Counter64(v) => v.to_string(),
            SnmpValue::NoSuchObject => "noSuchObject".to_string(),
            SnmpValue::NoSuchInstance => "noSuchInstance".to_string(),
            SnmpValue::EndOfMibView => "endOfMibView".to_string(),
        }
    }
}

// ── PDUs ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Pdu {
    pub tag: u8,
    pub request_id: i64,
    /// error-status on GET/GETNEXT/Response; non-repeaters on GETBULK.
    pub error_status: i64,
    /// error-index on GET/GETNEXT/Response; max-repetitions on GETBULK.
    pub error_index: i64,
    pub varbinds: Vec<(Oid, SnmpValue)>,
}

impl Pdu {
    pub fn get_request(request_id: i64, oids: Vec<Oid>) -> Self {
        Self {
            tag: TAG_GET_REQUEST,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.into_iter().map(|o| (o, SnmpValue::Null)).collect(),
        }
    }

    pub fn get_bulk_request(
        request_id: i64,
        oids: Vec<Oid>,
        non_repeaters: u32,
        max_repetitions: u32,
    ) -> Self {
        Self {
            tag: TAG_GET_BULK_REQUEST,
            request_id,
            error_status: non_repeaters as i64,
            error_index: max_repetitions as i64,
            varbinds: oids.into_iter().map(|o| (o, SnmpValue::Null)).collect(),
        }
    }
}

// ── Encoding ──────────────────────────────────────────────────────────────────

fn encode_length(buf: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        buf.push(len as u8);
    } else {
        let bytes = len.to_be_bytes();
        let skip = bytes.iter().take_while(|&&b| b == 0).count();
        let significant = &bytes[skip..];
        buf.push(0x80 | significant.len() as u8);
        buf.extend_from_slice(significant);
    }
}

fn encode_tlv(buf: &mut Vec<u8>, tag: u8, content: &[u8]) {
    buf.push(tag);
    encode_length(buf, content.len());
    buf.extend_from_slice(content);
}

fn encode_integer(buf: &mut Vec<u8>, value: i64) {
    let mut bytes = value.to_be_bytes().to_vec();
    // Trim redundant sign bytes while preserving the sign bit.
    while bytes.len() > 1 {
        let (first, second) = (bytes[0], bytes[1]);
        if (first == 0x00 && second & 0x80 == 0) || (first == 0xff && second & 0x80 != 0) {
            bytes.remove(0);
        } else {
            break;
        }
    }
    encode_tlv(buf, TAG_INTEGER, &bytes);
}

fn encode_oid(buf: &mut Vec<u8>, oid: &Oid) -> Result<(), SnmpError> {
    let arcs = &oid.0;
    if arcs.len() < 2 || arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) {
        return Err(SnmpError::Codec(format!("unencodable OID {oid}")));
    }
    let mut content = Vec::new();
    encode_subid(&mut content, arcs[0] * 40 + arcs[1]);
    for &arc in &arcs[2..] {
        encode_subid(&mut content, arc);
    }
    encode_tlv(buf, TAG_OID, &content);
    Ok(())
}

fn encode_subid(buf: &mut Vec<u8>, mut value: u64) {
    let mut stack = [0u8; 10];
    let mut n = 0;
    loop {
        stack[n] = (value & 0x7f) as u8;
        value >>= 7;
        n += 1;
        if value == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let mut byte = stack[i];
        if i != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
    }
}

fn encode_value(buf: &mut Vec<u8>, value: &SnmpValue) -> Result<(), SnmpError> {
    match value {
        SnmpValue::Null => encode_tlv(buf, TAG_NULL, &[]),
        SnmpValue::Integer(v) => encode_integer(buf, *v),
        SnmpValue::OctetString(bytes) => encode_tlv(buf, TAG_OCTET_STRING, bytes),
        SnmpValue::Oid(oid) => encode_oid(buf, oid)?,
        other => {
            return Err(SnmpError::Codec(format!(
                "value type not encodable in requests: {other:?}"
            )))
        }
    }
    Ok(())
}

/// Encode one SNMPv2c message: `SEQUENCE { version, community, pdu }`.
pub fn encode_message(community: &str, pdu: &Pdu) -> Result<Vec<u8>, SnmpError> {
    let mut varbinds = Vec::new();
    for (oid, value) in &pdu.varbinds {
        let mut vb = Vec::new();
        encode_oid(&mut vb, oid)?;
        encode_value(&mut vb, value)?;
        encode_tlv(&mut varbinds, TAG_SEQUENCE, &vb);
    }

    let mut pdu_content = Vec::new();
    encode_integer(&mut pdu_content, pdu.request_id);
    encode_integer(&mut pdu_content, pdu.error_status);
    encode_integer(&mut pdu_content, pdu.error_index);
    encode_tlv(&mut pdu_content, TAG_SEQUENCE, &varbinds);

    let mut message = Vec::new();
    encode_integer(&mut message, SNMP_VERSION_2C);
    encode_tlv(&mut message, TAG_OCTET_STRING, community.as_bytes());
    encode_tlv(&mut message, pdu.tag, &pdu_content);

    let mut out = Vec::new();
    encode_tlv(&mut out, TAG_SEQUENCE, &message);
    Ok(out)
}

// ── Decoding ──────────────────────────────────────────────────────────────────

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn byte(&mut self) -> Result<u8, SnmpError> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| SnmpError::Codec("truncated message".to_string()))?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], SnmpError> {
        if self.remaining() < n {
            return Err(SnmpError::Codec("truncated content".to_string()));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn length(&mut self) -> Result<usize, SnmpError> {
        let first = self.byte()?;
        if first & 0x80 == 0 {
            return Ok(first as usize);
        }
        let count = (first & 0x7f) as usize;
        if count == 0 || count > 8 {
            return Err(SnmpError::Codec("unsupported BER length".to_string()));
        }
        let mut len = 0usize;
        for _ in 0..count {
            len = (len << 8) | self.byte()? as usize;
        }
        Ok(len)
    }

    fn tlv(&mut self) -> Result<(u8, &'a [u8]), SnmpError> {
        let tag = self.byte()?;
        let len = self.length()?;
        Ok((tag, self.take(len)?))
    }

    fn expect(&mut self, expected: u8) -> Result<&'a [u8], SnmpError> {
        let (tag, content) = self.tlv()?;
        if tag != expected {
            return Err(SnmpError::Codec(format!(
                "expected tag 0x{expected:02x}, found 0x{tag:02x}"
            )));
        }
        Ok(content)
    }
}

fn decode_integer(content: &[u8]) -> Result<i64, SnmpError> {
    if content.is_empty() || content.len() > 8 {
        return Err(SnmpError::Codec("bad integer length".to_string()));
    }
    let mut value: i64 = if content[0] & 0x80 != 0 { -1 } else { 0 };
    for &b in content {
        value = (value << 8) | b as i64;
    }
    Ok(value)
}

fn decode_unsigned(content: &[u8]) -> Result<u64, SnmpError> {
    // Counters may carry a leading 0x00 pad byte for the sign.
    let content = if content.first() == Some(&0) && content.len() > 1 {
        &content[1..]
    } else {
        content
    };
    if content.len() > 8 {
        return Err(SnmpError::Codec("bad unsigned length".to_string()));
    }
    let mut value: u64 = 0;
    for &b in content {
        value = (value << 8) | b as u64;
    }
    Ok(value)
}

fn decode_oid(content: &[u8]) -> Result<Oid, SnmpError> {
    if content.is_empty() {
        return Err(SnmpError::Codec("empty OID".to_string()));
    }
    let mut arcs = Vec::new();
    let mut iter = content.iter().peekable();

    let mut first: u64 = 0;
    loop {
        let b = *iter
            .next()
            .ok_or_else(|| SnmpError::Codec("truncated OID".to_string()))?;
        first = (first << 7) | (b & 0x7f) as u64;
        if b & 0x80 == 0 {
            break;
        }
    }
    if first < 80 {
        arcs.push(first / 40);
        arcs.push(first % 40);
    } else {
        arcs.push(2);
        arcs.push(first - 80);
    }

    let mut current: u64 = 0;
    for &b in iter {
        current = (current << 7) | (b & 0x7f) as u64;
        if b & 0x80 == 0 {
            arcs.push(current);
            current = 0;
        }
    }
    Ok(Oid(arcs))
}

fn decode_value(tag: u8, content: &[u8]) -> Result<SnmpValue, SnmpError> {
    Ok(match tag {
        TAG_INTEGER => SnmpValue::Integer(decode_integer(content)?),
        TAG_OCTET_STRING => SnmpValue::OctetString(content.to_vec()),
        TAG_NULL => SnmpValue::Null,
        TAG_OID => SnmpValue::Oid(decode_oid(content)?),
        TAG_IP_ADDRESS => {
            if content.len() != 4 {
                return Err(SnmpError::Codec("bad IpAddress length".to_string()));
            }
            SnmpValue::IpAddress([content[0], content[1], content[2], content[3]])
        }
        TAG_COUNTER32 => SnmpValue::Counter32(decode_unsigned(content)? as u32),
        TAG_GAUGE32 => SnmpValue::Gauge32(decode_unsigned(content)? as u32),
        TAG_TIMETICKS => SnmpValue::TimeTicks(decode_unsigned(content)? as u32),
        TAG_COUNTER64 => SnmpValue::Counter64(decode_unsigned(content)?),
        TAG_OPAQUE => SnmpValue::Opaque(content.to_vec()),
        TAG_NO_SUCH_OBJECT => SnmpValue::NoSuchObject,
        TAG_NO_SUCH_INSTANCE => SnmpValue::NoSuchInstance,
        TAG_END_OF_MIB_VIEW => SnmpValue::EndOfMibView,
        // Unknown type: keep the bytes visible rather than failing the walk.
        _ => SnmpValue::Opaque(content.to_vec()),
    })
}

/// Decoded SNMPv2c message.
#[derive(Debug)]
pub struct Message {
    pub community: String,
    pub pdu: Pdu,
}

pub fn decode_message(data: &[u8]) -> Result<Message, SnmpError> {
    let mut outer = Reader::new(data);
    let message = outer.expect(TAG_SEQUENCE)?;
    let mut reader = Reader::new(message);

    let version = decode_integer(reader.expect(TAG_INTEGER)?)?;
    if version != SNMP_VERSION_2C {
        return Err(SnmpError::Codec(format!("unsupported SNMP version {version}")));
    }
    let community = String::from_utf8_lossy(reader.expect(TAG_OCTET_STRING)?).to_string();

    let (pdu_tag, pdu_content) = reader.tlv()?;
    let mut pdu_reader = Reader::new(pdu_content);
    let request_id = decode_integer(pdu_reader.expect(TAG_INTEGER)?)?;
    let error_status = decode_integer(pdu_reader.expect(TAG_INTEGER)?)?;
    let error_index = decode_integer(pdu_reader.expect(TAG_INTEGER)?)?;

    let varbind_list = pdu_reader.expect(TAG_SEQUENCE)?;
    let mut vb_reader = Reader::new(varbind_list);
    let mut varbinds = Vec::new();
    while vb_reader.remaining() > 0 {
        let vb = vb_reader.expect(TAG_SEQUENCE)?;
        let mut one = Reader::new(vb);
        let oid = decode_oid(one.expect(TAG_OID)?)?;
        let (value_tag, value_content) = one.tlv()?;
        varbinds.push((oid, decode_value(value_tag, value_content)?));
    }

    Ok(Message {
        community,
        pdu: Pdu {
            tag: pdu_tag,
            request_id,
            error_status,
            error_index,
            varbinds,
        },
    })
}
