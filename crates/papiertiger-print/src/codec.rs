// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binary IPP message codec (RFC 8010).
//
// Requests and responses share one wire layout; the 16-bit field after the
// version bytes carries the operation-id in a request and the status-code
// in a response.  `decode` and `encode` are exact inverses over that shared
// layout, so every message — inbound or outbound — goes through a single
// wire path:
//
// ```text
// version-number:  2 bytes (major, minor)
// operation-id or
// status-code:     2 bytes (big-endian u16)
// request-id:      4 bytes (big-endian u32)
// attribute-groups: variable
//   delimiter-tag: 1 byte (0x00..=0x0F)
//   attributes:    variable
//     value-tag:    1 byte
//     name-length:  2 bytes (big-endian u16)
//     name:         name-length bytes
//     value-length: 2 bytes (big-endian u16)
//     value:        value-length bytes
// end-of-attributes-tag: 1 byte (0x03)
// document-data: remainder
// ```
//
// The codec is stateless: decoding borrows the input slice and allocates a
// single owned message, encoding writes one output buffer.

use papiertiger_core::error::{PrinterError, Result};

// ---------------------------------------------------------------------------
// IPP version bytes
// ---------------------------------------------------------------------------

/// IPP version 1.1 major byte.
pub const IPP_VERSION_MAJOR: u8 = 0x01;

/// IPP version 1.1 minor byte.
pub const IPP_VERSION_MINOR: u8 = 0x01;

// ---------------------------------------------------------------------------
// IPP delimiter tags (RFC 8010 §3.5.1)
// ---------------------------------------------------------------------------

/// Operation attributes group delimiter.
pub const TAG_OPERATION_ATTRIBUTES: u8 = 0x01;

/// Job attributes group delimiter.
pub const TAG_JOB_ATTRIBUTES: u8 = 0x02;

/// End-of-attributes-tag — terminates the attribute section.
pub const TAG_END_OF_ATTRIBUTES: u8 = 0x03;

/// Printer attributes group delimiter.
pub const TAG_PRINTER_ATTRIBUTES: u8 = 0x04;

// ---------------------------------------------------------------------------
// IPP value tags (RFC 8010 §3.5.2)
// ---------------------------------------------------------------------------

/// Integer value (4 bytes, signed big-endian).
pub const VALUE_TAG_INTEGER: u8 = 0x21;

/// Boolean value (1 byte: 0x00 = false, 0x01 = true).
pub const VALUE_TAG_BOOLEAN: u8 = 0x22;

/// Enum value (4 bytes, same encoding as integer).
pub const VALUE_TAG_ENUM: u8 = 0x23;

/// textWithoutLanguage (UTF-8 string).
pub const VALUE_TAG_TEXT: u8 = 0x41;

/// nameWithoutLanguage (UTF-8 string).
pub const VALUE_TAG_NAME: u8 = 0x42;

/// keyword (US-ASCII string, used for document-format etc.).
pub const VALUE_TAG_KEYWORD: u8 = 0x44;

/// uri (US-ASCII string).
pub const VALUE_TAG_URI: u8 = 0x45;

/// charset (US-ASCII string, e.g. "utf-8").
pub const VALUE_TAG_CHARSET: u8 = 0x47;

/// naturalLanguage (US-ASCII string, e.g. "en").
pub const VALUE_TAG_NATURAL_LANGUAGE: u8 = 0x48;

// ---------------------------------------------------------------------------
// IPP operation IDs (RFC 8011 §4)
// ---------------------------------------------------------------------------

/// Print-Job operation identifier.
pub const OP_PRINT_JOB: u16 = 0x0002;

/// Validate-Job operation identifier.
pub const OP_VALIDATE_JOB: u16 = 0x0004;

/// Cancel-Job operation identifier.
pub const OP_CANCEL_JOB: u16 = 0x0008;

/// Get-Job-Attributes operation identifier.
pub const OP_GET_JOB_ATTRIBUTES: u16 = 0x0009;

/// Get-Jobs operation identifier.
pub const OP_GET_JOBS: u16 = 0x000A;

/// Get-Printer-Attributes operation identifier.
pub const OP_GET_PRINTER_ATTRIBUTES: u16 = 0x000B;

// ---------------------------------------------------------------------------
// IPP status codes (RFC 8011 §4.1.8)
// ---------------------------------------------------------------------------

/// Successful completion.
pub const STATUS_OK: u16 = 0x0000;

/// Client sent a malformed request.
pub const STATUS_CLIENT_ERROR_BAD_REQUEST: u16 = 0x0400;

/// The request is valid but not possible in the current state.
pub const STATUS_CLIENT_ERROR_NOT_POSSIBLE: u16 = 0x0401;

/// The requested job was not found.
pub const STATUS_CLIENT_ERROR_NOT_FOUND: u16 = 0x0406;

/// The requested document format is not supported.
pub const STATUS_CLIENT_ERROR_DOCUMENT_FORMAT_NOT_SUPPORTED: u16 = 0x040A;

/// Internal server error.
pub const STATUS_SERVER_ERROR_INTERNAL: u16 = 0x0500;

/// The requested operation is not supported.
pub const STATUS_SERVER_ERROR_OPERATION_NOT_SUPPORTED: u16 = 0x0501;

// ---------------------------------------------------------------------------
// Message model
// ---------------------------------------------------------------------------

/// A single IPP attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The value tag describing the type of this attribute.
    pub tag: u8,
    /// Attribute name (empty for additional values in a 1setOf).
    pub name: String,
    /// Raw value bytes.
    pub value: Vec<u8>,
}

/// A group of attributes delimited by a group tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeGroup {
    /// The delimiter tag for this group (0x01, 0x02, 0x04, ...).
    pub delimiter: u8,
    /// Ordered list of attributes within the group.
    pub attributes: Vec<Attribute>,
}

impl AttributeGroup {
    pub fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            attributes: Vec::new(),
        }
    }

    /// Find the first attribute with the given name.
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Read the first attribute with the given name as a UTF-8 string.
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.get(name)
            .and_then(|a| String::from_utf8(a.value.clone()).ok())
    }

    /// Read the first attribute with the given name as an i32 integer.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(|a| {
            let bytes: [u8; 4] = a.value.as_slice().try_into().ok()?;
            Some(i32::from_be_bytes(bytes))
        })
    }
}

/// A fully decoded IPP message.
///
/// `code` is the operation-id when this is a request and the status-code
/// when it is a response; the two occupy the same wire position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IppMessage {
    pub version_major: u8,
    pub version_minor: u8,
    pub code: u16,
    /// The request-id (echoed back in the response).
    pub request_id: u32,
    /// All attribute groups in wire order.
    pub groups: Vec<AttributeGroup>,
    /// Document data (everything after the end-of-attributes tag).
    pub data: Vec<u8>,
}

impl IppMessage {
    /// Get the first operation-attributes group.
    pub fn operation_attributes(&self) -> Option<&AttributeGroup> {
        self.groups
            .iter()
            .find(|g| g.delimiter == TAG_OPERATION_ATTRIBUTES)
    }

    /// Get the first job-attributes group.
    pub fn job_attributes(&self) -> Option<&AttributeGroup> {
        self.groups
            .iter()
            .find(|g| g.delimiter == TAG_JOB_ATTRIBUTES)
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Decode a raw IPP message.
///
/// Fails with [`PrinterError::MalformedMessage`] when the header is shorter
/// than 8 bytes, when a name/value length field or its body is truncated,
/// when an attribute appears before any group delimiter, or when the data
/// ends before the end-of-attributes tag.
pub fn decode(data: &[u8]) -> Result<IppMessage> {
    if data.len() < 8 {
        return Err(PrinterError::MalformedMessage(format!(
            "header too short: {} bytes (minimum 8)",
            data.len()
        )));
    }

    let version_major = data[0];
    let version_minor = data[1];
    let code = u16::from_be_bytes([data[2], data[3]]);
    let request_id = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);

    let mut pos = 8;
    let mut groups: Vec<AttributeGroup> = Vec::new();
    let mut current: Option<AttributeGroup> = None;
    let mut terminated = false;

    while pos < data.len() {
        let tag = data[pos];

        // Delimiter tags occupy 0x00..=0x0F.
        if tag <= 0x0F {
            if let Some(group) = current.take() {
                groups.push(group);
            }

            if tag == TAG_END_OF_ATTRIBUTES {
                pos += 1;
                terminated = true;
                break;
            }

            current = Some(AttributeGroup::new(tag));
            pos += 1;
            continue;
        }

        // Otherwise this is a value tag — parse a full attribute.
        let value_tag = tag;
        pos += 1;

        if pos + 2 > data.len() {
            return Err(PrinterError::MalformedMessage(
                "truncated name-length field".into(),
            ));
        }
        let name_length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        pos += 2;

        if pos + name_length > data.len() {
            return Err(PrinterError::MalformedMessage(
                "truncated attribute name".into(),
            ));
        }
        let name = String::from_utf8_lossy(&data[pos..pos + name_length]).to_string();
        pos += name_length;

        if pos + 2 > data.len() {
            return Err(PrinterError::MalformedMessage(
                "truncated value-length field".into(),
            ));
        }
        let value_length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        pos += 2;

        if pos + value_length > data.len() {
            return Err(PrinterError::MalformedMessage(
                "truncated attribute value".into(),
            ));
        }
        let value = data[pos..pos + value_length].to_vec();
        pos += value_length;

        match current {
            Some(ref mut group) => group.attributes.push(Attribute {
                tag: value_tag,
                name,
                value,
            }),
            None => {
                return Err(PrinterError::MalformedMessage(
                    "attribute outside of any group".into(),
                ));
            }
        }
    }

    if !terminated {
        return Err(PrinterError::MalformedMessage(
            "missing end-of-attributes tag".into(),
        ));
    }

    Ok(IppMessage {
        version_major,
        version_minor,
        code,
        request_id,
        groups,
        data: data[pos..].to_vec(),
    })
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Encode a message back to its wire form. Exact inverse of [`decode`]:
/// `decode(&encode(&m)).unwrap() == m` for any well-formed `m`.
pub fn encode(msg: &IppMessage) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256 + msg.data.len());
    buf.push(msg.version_major);
    buf.push(msg.version_minor);
    buf.extend_from_slice(&msg.code.to_be_bytes());
    buf.extend_from_slice(&msg.request_id.to_be_bytes());

    for group in &msg.groups {
        buf.push(group.delimiter);
        for attr in &group.attributes {
            buf.push(attr.tag);
            buf.extend_from_slice(&(attr.name.len() as u16).to_be_bytes());
            buf.extend_from_slice(attr.name.as_bytes());
            buf.extend_from_slice(&(attr.value.len() as u16).to_be_bytes());
            buf.extend_from_slice(&attr.value);
        }
    }

    buf.push(TAG_END_OF_ATTRIBUTES);
    buf.extend_from_slice(&msg.data);
    buf
}

// ---------------------------------------------------------------------------
// Response builder
// ---------------------------------------------------------------------------

/// Builder for constructing IPP response messages.
///
/// Accumulates attribute groups in order and encodes through [`encode`].
pub struct ResponseBuilder {
    msg: IppMessage,
}

impl ResponseBuilder {
    /// Create a new response with the given status code and request-id.
    pub fn new(status_code: u16, request_id: u32) -> Self {
        Self {
            msg: IppMessage {
                version_major: IPP_VERSION_MAJOR,
                version_minor: IPP_VERSION_MINOR,
                code: status_code,
                request_id,
                groups: Vec::new(),
                data: Vec::new(),
            },
        }
    }

    /// Start a new attribute group.
    pub fn begin_group(&mut self, delimiter: u8) -> &mut Self {
        self.msg.groups.push(AttributeGroup::new(delimiter));
        self
    }

    /// Write a textWithoutLanguage attribute.
    pub fn text(&mut self, name: &str, value: &str) -> &mut Self {
        self.attr(VALUE_TAG_TEXT, name, value.as_bytes())
    }

    /// Write a nameWithoutLanguage attribute.
    pub fn name_attr(&mut self, name: &str, value: &str) -> &mut Self {
        self.attr(VALUE_TAG_NAME, name, value.as_bytes())
    }

    /// Write a keyword attribute.
    pub fn keyword(&mut self, name: &str, value: &str) -> &mut Self {
        self.attr(VALUE_TAG_KEYWORD, name, value.as_bytes())
    }

    /// Write an additional keyword value for a 1setOf keyword.
    ///
    /// Per RFC 8010 §3.1.4, additional values have name-length = 0.
    pub fn keyword_additional(&mut self, value: &str) -> &mut Self {
        self.attr(VALUE_TAG_KEYWORD, "", value.as_bytes())
    }

    /// Write a URI attribute.
    pub fn uri(&mut self, name: &str, value: &str) -> &mut Self {
        self.attr(VALUE_TAG_URI, name, value.as_bytes())
    }

    /// Write a charset attribute.
    pub fn charset(&mut self, name: &str, value: &str) -> &mut Self {
        self.attr(VALUE_TAG_CHARSET, name, value.as_bytes())
    }

    /// Write a naturalLanguage attribute.
    pub fn natural_language(&mut self, name: &str, value: &str) -> &mut Self {
        self.attr(VALUE_TAG_NATURAL_LANGUAGE, name, value.as_bytes())
    }

    /// Write an integer attribute.
    pub fn integer(&mut self, name: &str, value: i32) -> &mut Self {
        self.attr(VALUE_TAG_INTEGER, name, &value.to_be_bytes())
    }

    /// Write an enum attribute (same wire encoding as integer).
    pub fn enum_attr(&mut self, name: &str, value: i32) -> &mut Self {
        self.attr(VALUE_TAG_ENUM, name, &value.to_be_bytes())
    }

    /// Write a boolean attribute.
    pub fn boolean(&mut self, name: &str, value: bool) -> &mut Self {
        self.attr(VALUE_TAG_BOOLEAN, name, &[if value { 0x01 } else { 0x00 }])
    }

    /// Write a raw attribute into the current group.
    ///
    /// Attributes before the first `begin_group` call would be unreachable
    /// on the wire; that is a programming error, so debug builds assert.
    pub fn attr(&mut self, tag: u8, name: &str, value: &[u8]) -> &mut Self {
        debug_assert!(!self.msg.groups.is_empty(), "attribute before any group");
        if let Some(group) = self.msg.groups.last_mut() {
            group.attributes.push(Attribute {
                tag,
                name: name.to_string(),
                value: value.to_vec(),
            });
        }
        self
    }

    /// Finalise the response and return its wire bytes.
    pub fn build(self) -> Vec<u8> {
        encode(&self.msg)
    }
}


#[cfg(test)]
mod tests {
    use super::testutil::build_test_request;
    use super::*;

    // -- decoding -----------------------------------------------------------

    #[test]
    fn decode_minimal_request() {
        let data = build_test_request(OP_GET_PRINTER_ATTRIBUTES, 42, &[], &[]);
        let msg = decode(&data).expect("decode should succeed");

        assert_eq!(msg.version_major, 1);
        assert_eq!(msg.version_minor, 1);
        assert_eq!(msg.code, OP_GET_PRINTER_ATTRIBUTES);
        assert_eq!(msg.request_id, 42);
        assert_eq!(msg.groups.len(), 1);
        assert!(msg.data.is_empty());
    }

    #[test]
    fn decode_request_with_document_data() {
        let doc = b"Hello, printer!";
        let data = build_test_request(OP_PRINT_JOB, 100, &[], doc);
        let msg = decode(&data).expect("decode should succeed");

        assert_eq!(msg.code, OP_PRINT_JOB);
        assert_eq!(msg.data, doc);
    }

    #[test]
    fn decode_request_with_custom_attributes() {
        let attrs = vec![
            (VALUE_TAG_NAME, "job-name", b"Quarterly Report" as &[u8]),
            (VALUE_TAG_KEYWORD, "document-format", b"application/postscript"),
        ];
        let data = build_test_request(OP_PRINT_JOB, 7, &attrs, &[]);
        let msg = decode(&data).expect("decode should succeed");

        let op = msg.operation_attributes().expect("op attrs");
        assert_eq!(op.get_str("job-name").as_deref(), Some("Quarterly Report"));
        assert_eq!(
            op.get_str("document-format").as_deref(),
            Some("application/postscript")
        );
    }

    #[test]
    fn decode_integer_attribute() {
        let job_id_bytes = 42i32.to_be_bytes();
        let attrs = vec![(VALUE_TAG_INTEGER, "job-id", &job_id_bytes[..])];
        let data = build_test_request(OP_CANCEL_JOB, 5, &attrs, &[]);
        let msg = decode(&data).expect("decode should succeed");

        let op = msg.operation_attributes().expect("op attrs");
        assert_eq!(op.get_i32("job-id"), Some(42));
        // Wrong-width values read as None, not a panic.
        assert_eq!(op.get_i32("attributes-charset"), None);
    }

    #[test]
    fn decode_rejects_short_header() {
        let result = decode(&[0x01, 0x01, 0x00]);
        assert!(matches!(result, Err(PrinterError::MalformedMessage(_))));
    }

    #[test]
    fn decode_rejects_truncated_name_length() {
        let mut data = vec![0x01, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01];
        data.push(TAG_OPERATION_ATTRIBUTES);
        data.push(VALUE_TAG_KEYWORD);
        data.push(0x00); // half of a name-length field
        let result = decode(&data);
        assert!(matches!(result, Err(PrinterError::MalformedMessage(_))));
    }

    #[test]
    fn decode_rejects_truncated_value() {
        let mut data = vec![0x01, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01];
        data.push(TAG_OPERATION_ATTRIBUTES);
        data.push(VALUE_TAG_KEYWORD);
        data.extend_from_slice(&1u16.to_be_bytes());
        data.push(b'a');
        data.extend_from_slice(&100u16.to_be_bytes()); // value-length 100, no value
        let result = decode(&data);
        assert!(matches!(result, Err(PrinterError::MalformedMessage(_))));
    }

    #[test]
    fn decode_rejects_attribute_outside_group() {
        let mut data = vec![0x01, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01];
        // A value tag with no preceding group delimiter.
        data.push(VALUE_TAG_KEYWORD);
        data.extend_from_slice(&1u16.to_be_bytes());
        data.push(b'a');
        data.extend_from_slice(&1u16.to_be_bytes());
        data.push(b'b');
        data.push(TAG_END_OF_ATTRIBUTES);
        let result = decode(&data);
        assert!(matches!(result, Err(PrinterError::MalformedMessage(_))));
    }

    #[test]
    fn decode_rejects_missing_end_tag() {
        let mut data = vec![0x01, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01];
        data.push(TAG_OPERATION_ATTRIBUTES);
        // Stream ends inside the attribute section.
        let result = decode(&data);
        assert!(matches!(result, Err(PrinterError::MalformedMessage(_))));
    }

    // -- round-trip ---------------------------------------------------------

    #[test]
    fn roundtrip_multiple_groups_and_data() {
        let msg = IppMessage {
            version_major: 2,
            version_minor: 0,
            code: OP_PRINT_JOB,
            request_id: 0xDEADBEEF,
            groups: vec![
                AttributeGroup {
                    delimiter: TAG_OPERATION_ATTRIBUTES,
                    attributes: vec![
                        Attribute {
                            tag: VALUE_TAG_CHARSET,
                            name: "attributes-charset".into(),
                            value: b"utf-8".to_vec(),
                        },
                        Attribute {
                            tag: VALUE_TAG_KEYWORD,
                            name: "document-format".into(),
                            value: b"application/pdf".to_vec(),
                        },
                    ],
                },
                AttributeGroup {
                    delimiter: TAG_JOB_ATTRIBUTES,
                    attributes: vec![
                        Attribute {
                            tag: VALUE_TAG_INTEGER,
                            name: "job-id".into(),
                            value: 9i32.to_be_bytes().to_vec(),
                        },
                        // Additional value of a 1setOf: empty name.
                        Attribute {
                            tag: VALUE_TAG_KEYWORD,
                            name: String::new(),
                            value: b"second".to_vec(),
                        },
                    ],
                },
            ],
            data: b"%!PS-Adobe-3.0\n".to_vec(),
        };

        let decoded = decode(&encode(&msg)).expect("roundtrip decode");
        assert_eq!(decoded, msg);
    }

    #[test]
    fn roundtrip_empty_groups() {
        let msg = IppMessage {
            version_major: 1,
            version_minor: 1,
            code: STATUS_OK,
            request_id: 1,
            groups: vec![AttributeGroup::new(TAG_PRINTER_ATTRIBUTES)],
            data: Vec::new(),
        };
        assert_eq!(decode(&encode(&msg)).expect("decode"), msg);
    }

    #[test]
    fn roundtrip_no_groups_no_data() {
        let msg = IppMessage {
            version_major: 1,
            version_minor: 1,
            code: STATUS_OK,
            request_id: 7,
            groups: Vec::new(),
            data: Vec::new(),
        };
        assert_eq!(decode(&encode(&msg)).expect("decode"), msg);
    }

    // -- response builder ---------------------------------------------------

    #[test]
    fn builder_creates_valid_header() {
        let bytes = ResponseBuilder::new(STATUS_OK, 99).build();

        // Minimum: 8 byte header + 1 byte end-of-attributes.
        assert!(bytes.len() >= 9);
        assert_eq!(bytes[0], IPP_VERSION_MAJOR);
        assert_eq!(bytes[1], IPP_VERSION_MINOR);
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]), STATUS_OK);
        assert_eq!(u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 99);
        assert_eq!(*bytes.last().unwrap(), TAG_END_OF_ATTRIBUTES);
    }

    #[test]
    fn builder_roundtrip_with_attributes() {
        let mut builder = ResponseBuilder::new(STATUS_OK, 42);
        builder
            .begin_group(TAG_OPERATION_ATTRIBUTES)
            .charset("attributes-charset", "utf-8")
            .natural_language("attributes-natural-language", "en")
            .text("status-message", "successful-ok");
        builder
            .begin_group(TAG_JOB_ATTRIBUTES)
            .integer("job-id", 7)
            .enum_attr("job-state", 9)
            .boolean("job-preserved", false);

        let parsed = decode(&builder.build()).expect("parse response");

        assert_eq!(parsed.code, STATUS_OK);
        assert_eq!(parsed.request_id, 42);
        assert_eq!(parsed.groups.len(), 2);

        let op = &parsed.groups[0];
        assert_eq!(op.delimiter, TAG_OPERATION_ATTRIBUTES);
        assert_eq!(op.get_str("attributes-charset").as_deref(), Some("utf-8"));
        assert_eq!(op.get_str("status-message").as_deref(), Some("successful-ok"));

        let job = &parsed.groups[1];
        assert_eq!(job.delimiter, TAG_JOB_ATTRIBUTES);
        assert_eq!(job.get_i32("job-id"), Some(7));
        assert_eq!(job.get_i32("job-state"), Some(9));
        assert_eq!(job.get("job-preserved").unwrap().value, vec![0x00]);
    }

    #[test]
    fn keyword_additional_has_zero_name_length() {
        let mut builder = ResponseBuilder::new(STATUS_OK, 1);
        builder
            .begin_group(TAG_OPERATION_ATTRIBUTES)
            .keyword("test-attr", "first-value")
            .keyword_additional("second-value");

        let parsed = decode(&builder.build()).unwrap();
        let group = &parsed.groups[0];

        assert_eq!(group.attributes[0].name, "test-attr");
        assert_eq!(group.attributes[1].name, "");
        assert_eq!(
            String::from_utf8_lossy(&group.attributes[1].value),
            "second-value"
        );
    }
}
