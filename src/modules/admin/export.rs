use time::macros::format_description;

use crate::db::models::ExportRow;

const HEADERS: [&str; 11] = [
    "Registration Number",
    "Workshop",
    "Workshop Date",
    "Student Name",
    "Grade",
    "School",
    "Contact",
    "Email",
    "Payment Status",
    "Fee",
    "Registered Date",
];

/// Serialize export rows as CSV. Fields containing a comma, quote or
/// newline are quoted with doubled inner quotes.
pub fn to_csv(rows: &[ExportRow]) -> String {
    let date_fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let mut out = String::new();
    out.push_str(&HEADERS.join(","));
    out.push('\n');
    for row in rows {
        let registered_at = row
            .registered_at
            .format(&date_fmt)
            .unwrap_or_else(|_| String::new());
        let fields = [
            row.registration_number.clone(),
            row.workshop_name.clone(),
            row.workshop_date.clone(),
            row.student_name.clone(),
            row.grade.to_string(),
            row.school.clone(),
            row.contact_number.clone(),
            row.email.clone(),
            format!("{:?}", row.payment_status).to_lowercase(),
            row.fee.to_string(),
            registered_at,
        ];
        let line: Vec<String> = fields.iter().map(|f| escape(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::RegistrationStatus;
    use rust_decimal_macros::dec;
    use time::OffsetDateTime;

    fn row(name: &str) -> ExportRow {
        ExportRow {
            registration_number: "REG-20260824-A1B2C".to_string(),
            workshop_name: "Robotics 101".to_string(),
            workshop_date: "2026-09-01".to_string(),
            student_name: name.to_string(),
            grade: 7,
            school: "Model School".to_string(),
            contact_number: "01712345678".to_string(),
            email: "student@example.com".to_string(),
            payment_status: RegistrationStatus::Completed,
            fee: dec!(200.00),
            registered_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn header_row_first() {
        let csv = to_csv(&[]);
        assert!(csv.starts_with("Registration Number,Workshop,Workshop Date"));
    }

    #[test]
    fn plain_fields_pass_through() {
        let csv = to_csv(&[row("Rahim Uddin")]);
        let data_line = csv.lines().nth(1).unwrap();
        assert!(data_line.contains("REG-20260824-A1B2C"));
        assert!(data_line.contains("Rahim Uddin"));
        assert!(data_line.contains("completed"));
        assert!(data_line.contains("200.00"));
    }

    #[test]
    fn fields_with_commas_and_quotes_are_escaped() {
        let csv = to_csv(&[row("Uddin, Rahim \"Junior\"")]);
        let data_line = csv.lines().nth(1).unwrap();
        assert!(data_line.contains("\"Uddin, Rahim \"\"Junior\"\"\""));
    }
}
