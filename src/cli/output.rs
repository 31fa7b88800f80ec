//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::pipeline::RecordFailure;
use crate::store::{chrome_time_to_utc, CredentialRecord};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of decrypted logins (Origin, Username, Password, Created, Used).
///
/// Passwords are masked unless `show_passwords` is set.
pub fn print_logins_table(records: &[CredentialRecord], show_passwords: bool) {
    if records.is_empty() {
        info("No saved logins in this profile.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Origin", "Username", "Password", "Created", "Used"]);

    for record in records {
        let meta = &record.metadata;
        table.add_row(vec![
            meta.origin_url.clone(),
            meta.username_value.clone(),
            password_cell(record, show_passwords),
            format_chrome_time(meta.date_created),
            meta.times_used.to_string(),
        ]);
    }

    println!("{table}");
}

/// Print the logins a batch had to skip, with the reason for each.
pub fn print_failures(failures: &[RecordFailure]) {
    if failures.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Login", "Reason"]);

    for failure in failures {
        table.add_row(vec![
            failure.index.to_string(),
            failure.identity.to_string(),
            failure.cause().to_string(),
        ]);
    }

    eprintln!(
        "{}",
        style(format!("{} login(s) could not be processed:", failures.len()))
            .yellow()
            .bold()
    );
    eprintln!("{table}");
}

fn password_cell(record: &CredentialRecord, show_passwords: bool) -> String {
    match record.plaintext_str() {
        Some("") => "-".to_string(),
        Some(password) if show_passwords => password.to_string(),
        Some(_) => "********".to_string(),
        None if record.plaintext().is_some() => "<binary>".to_string(),
        None => "<sealed>".to_string(),
    }
}

fn format_chrome_time(micros: i64) -> String {
    chrome_time_to_utc(micros)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LoginMetadata;
    use zeroize::Zeroizing;

    fn revealed(password: &[u8]) -> CredentialRecord {
        let mut record = CredentialRecord::sealed(LoginMetadata::default(), b"v10...".to_vec());
        record.reveal(Zeroizing::new(password.to_vec()));
        record
    }

    #[test]
    fn passwords_are_masked_by_default() {
        assert_eq!(password_cell(&revealed(b"hunter2"), false), "********");
        assert_eq!(password_cell(&revealed(b"hunter2"), true), "hunter2");
        assert_eq!(password_cell(&revealed(b""), true), "-");
    }

    #[test]
    fn sealed_and_binary_cells() {
        let sealed = CredentialRecord::sealed(LoginMetadata::default(), b"v10".to_vec());
        assert_eq!(password_cell(&sealed, true), "<sealed>");
        assert_eq!(password_cell(&revealed(&[0xff, 0xfe]), true), "<binary>");
    }

    #[test]
    fn zero_chrome_time_is_dash() {
        assert_eq!(format_chrome_time(0), "-");
        assert_eq!(format_chrome_time(13_000_000_000_000_000).len(), 19);
    }
}
