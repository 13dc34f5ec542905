//! Tenant roster CSV mapping.
//!
//! Fixed column order: floor label, apartment, name, ownership label, phone,
//! second phone, owner name, owner phone (and the entrance on export). The
//! format is the hand-rolled comma-split the committee's spreadsheets use,
//! not a quoted CSV dialect.

use crate::building::{Entrance, Ownership, PaymentMethod, Tenant};
use crate::document::new_id;

pub const CSV_HEADER: &str =
    "Floor,Apartment,Name,Ownership,Phone,Phone 2,Owner name,Owner phone,Entrance";

/// Parse roster text into well-formed tenants for one entrance.
///
/// The first line is assumed to be a header and skipped. Rows missing an
/// apartment or a name are skipped. Every produced tenant is fully formed:
/// fresh unique id, payment method defaulted to cash.
pub fn parse_tenants(text: &str, entrance: Entrance) -> Vec<Tenant> {
    text.lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_row(line, entrance))
        .collect()
}

fn parse_row(line: &str, entrance: Entrance) -> Option<Tenant> {
    let columns: Vec<&str> = line.split(',').map(str::trim).collect();
    if columns.len() < 4 {
        return None;
    }
    let apartment = columns[1];
    let name = columns[2];
    if apartment.is_empty() || name.is_empty() {
        return None;
    }

    let ownership = if columns[3].to_lowercase().contains("rent") {
        Ownership::Renter
    } else {
        Ownership::Owner
    };

    Some(Tenant {
        id: new_id(),
        apartment: apartment.to_string(),
        floor: parse_floor(columns[0]),
        name: name.to_string(),
        ownership,
        owner_name: meaningful(columns.get(6)),
        owner_phone: meaningful(columns.get(7)),
        entrance,
        phone: columns.get(4).unwrap_or(&"").to_string(),
        phone2: meaningful(columns.get(5)),
        monthly_amount: None,
        payment_method: PaymentMethod::Cash,
        credit_day: None,
    })
}

/// First run of digits in the floor label ("Floor 3" → 3); 1 when absent.
fn parse_floor(label: &str) -> i32 {
    let digits: String = label
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(1)
}

/// A cell counts as present when non-empty and not the `*` placeholder.
fn meaningful(cell: Option<&&str>) -> Option<String> {
    match cell.copied() {
        Some(value) if !value.is_empty() && value != "*" => Some(value.to_string()),
        _ => None,
    }
}

/// Render tenants back to roster text, one row per tenant, `*` for absent
/// owner cells.
pub fn render_tenants(tenants: &[Tenant]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for tenant in tenants {
        let ownership = match tenant.ownership {
            Ownership::Owner => "owner",
            Ownership::Renter => "renter",
        };
        out.push_str(&format!(
            "Floor {},{},{},{},{},{},{},{},{}\n",
            tenant.floor,
            tenant.apartment,
            tenant.name,
            ownership,
            tenant.phone,
            tenant.phone2.as_deref().unwrap_or(""),
            tenant.owner_name.as_deref().unwrap_or("*"),
            tenant.owner_phone.as_deref().unwrap_or("*"),
            tenant.entrance.label(),
        ));
    }
    out
}
