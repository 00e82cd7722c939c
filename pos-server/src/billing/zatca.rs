//! ZATCA (phase 1) e-invoice QR payload
//!
//! Tag-length-value encoding, base64 (STANDARD) wrapped:
//!
//! | tag | value |
//! |-----|-------|
//! | 1 | seller name |
//! | 2 | VAT registration number |
//! | 3 | invoice timestamp (ISO-8601) |
//! | 4 | invoice total incl. VAT (`%.2f`) |
//! | 5 | VAT total (`%.2f`) |

use base64::{Engine as _, engine::general_purpose::STANDARD};

/// Single-byte length field
const MAX_VALUE_LEN: usize = 255;

fn push_tlv(buf: &mut Vec<u8>, tag: u8, value: &str) {
    let mut end = value.len().min(MAX_VALUE_LEN);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let bytes = &value.as_bytes()[..end];
    buf.push(tag);
    buf.push(bytes.len() as u8);
    buf.extend_from_slice(bytes);
}

/// Build the raw TLV bytes
pub fn encode_tlv(
    seller_name: &str,
    vat_number: &str,
    timestamp_iso: &str,
    total_with_vat: f64,
    vat_total: f64,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);
    push_tlv(&mut buf, 1, seller_name);
    push_tlv(&mut buf, 2, vat_number);
    push_tlv(&mut buf, 3, timestamp_iso);
    push_tlv(&mut buf, 4, &format!("{:.2}", total_with_vat));
    push_tlv(&mut buf, 5, &format!("{:.2}", vat_total));
    buf
}

/// Base64 TLV string to embed in the receipt QR code
pub fn qr_base64(
    seller_name: &str,
    vat_number: &str,
    timestamp_iso: &str,
    total_with_vat: f64,
    vat_total: f64,
) -> String {
    STANDARD.encode(encode_tlv(
        seller_name,
        vat_number,
        timestamp_iso,
        total_with_vat,
        vat_total,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_tags_in_order() {
        let tlv = encode_tlv("Shop", "300000000000003", "2025-01-01T10:00:00+03:00", 115.0, 15.0);
        assert_eq!(&tlv[..6], &[1, 4, b'S', b'h', b'o', b'p']);
        assert_eq!(tlv[6], 2);
        assert_eq!(tlv[7], 15);

        // Last field: tag 5, "15.00"
        let tail = &tlv[tlv.len() - 7..];
        assert_eq!(tail, &[5, 5, b'1', b'5', b'.', b'0', b'0']);
    }

    #[test]
    fn base64_round_trips_to_tlv() {
        let encoded = qr_base64("مطعم", "3001", "2025-01-01T10:00:00Z", 10.5, 1.37);
        let decoded = STANDARD.decode(encoded).unwrap();
        // Arabic seller name is 8 UTF-8 bytes
        assert_eq!(decoded[0], 1);
        assert_eq!(decoded[1], 8);
        assert!(String::from_utf8_lossy(&decoded).contains("10.50"));
    }

    #[test]
    fn long_values_are_truncated_on_char_boundary() {
        let long = "ب".repeat(200);
        let tlv = encode_tlv(&long, "", "", 0.0, 0.0);
        assert_eq!(tlv[1], 254);
    }
}
