use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// RFC 3339 timestamp with the characters that are awkward in file names
/// replaced, for naming log files.
pub fn file_stamp(at: OffsetDateTime) -> Result<String, time::error::Format> {
    Ok(at.format(&Rfc3339)?.replace([':', '.'], "-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stamp_has_no_colons() {
        let value = file_stamp(OffsetDateTime::UNIX_EPOCH).expect("stamp");
        assert_eq!(value, "1970-01-01T00-00-00Z");
    }
}
