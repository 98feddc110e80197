//! # WhatsApp Phone Normalization & Message Templates
//!
//! Numbers are normalized to digits-only international format with the
//! Indonesian country code:
//!
//! ```text
//! "0812-3456-789"   ->  "62812345678 9" minus separators -> "628123456789"
//! "812 3456 789"    ->  "628123456789"   (62 prepended)
//! "+62812345 6789"  ->  "628123456789"   (already prefixed)
//! "---"             ->  None             (no digits at all)
//! ```

/// Normalizes a raw phone number for WhatsApp dispatch.
///
/// Strips every non-digit character, then applies the country-code rule:
/// a leading `0` is replaced by `62`, and numbers without the `62` prefix
/// get it prepended. Returns `None` when the input holds no digits.
pub fn normalize_whatsapp(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    if let Some(rest) = digits.strip_prefix('0') {
        Some(format!("62{rest}"))
    } else if digits.starts_with("62") {
        Some(digits)
    } else {
        Some(format!("62{digits}"))
    }
}

/// Builds the restock WhatsApp message for a waiting customer.
///
/// Template mirrors what the counter staff would otherwise type by hand:
/// greeting, the medicine that came back in stock, how much is on hand, and
/// when the customer asked for it.
pub fn restock_message(
    customer_name: &str,
    medicine_name: &str,
    available: i64,
    unit: &str,
    requested_on: &str,
) -> String {
    format!(
        "*APOTEK NOTIFICATION*\n\n\
         Halo {customer_name}!\n\n\
         Kabar baik! Obat yang Anda tunggu sudah tersedia kembali:\n\n\
         *{medicine_name}*\n\
         Jumlah tersedia: {available} {unit}\n\
         Tanggal permintaan: {requested_on}\n\n\
         Silakan datang ke apotek kami untuk mengambil obat tersebut.\n\
         Stok terbatas, jadi pastikan Anda datang segera!\n\n\
         Terima kasih!"
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
