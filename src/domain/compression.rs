use crate::error::BackupError;

/// Compression applied to a backup artifact, encoded in its filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionKind {
    None,
    Gzip,
    Bzip2,
}

/// Known extensions, longest suffix first so `.sql.gz` wins over `.sql`.
const EXTENSIONS: [(&str, CompressionKind); 3] = [
    (".sql.bz2", CompressionKind::Bzip2),
    (".sql.gz", CompressionKind::Gzip),
    (".sql", CompressionKind::None),
];

impl CompressionKind {
    /// Extension carried by artifacts of this kind, including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            CompressionKind::None => ".sql",
            CompressionKind::Gzip => ".sql.gz",
            CompressionKind::Bzip2 => ".sql.bz2",
        }
    }

    /// Logical name of the compressor binary, if any.
    pub fn binary(self) -> Option<&'static str> {
        match self {
            CompressionKind::None => None,
            CompressionKind::Gzip => Some("gzip"),
            CompressionKind::Bzip2 => Some("bzip2"),
        }
    }

    /// Matches a filename against the extension grammar.
    ///
    /// Returns `None` for anything that is not a backup file; listing
    /// callers skip those, export/import callers escalate via [`Self::resolve`].
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(ext, _)| lower.ends_with(ext))
            .map(|&(_, kind)| kind)
    }

    /// Strict form of [`Self::from_filename`] for filename validation.
    pub fn resolve(filename: &str) -> Result<Self, BackupError> {
        Self::from_filename(filename)
            .ok_or_else(|| BackupError::InvalidExtension(filename.to_string()))
    }

    /// Maps an explicit user selection to a kind.
    pub fn from_name(name: &str) -> Result<Self, BackupError> {
        match name {
            "none" => Ok(CompressionKind::None),
            "gzip" => Ok(CompressionKind::Gzip),
            "bzip2" => Ok(CompressionKind::Bzip2),
            other => Err(BackupError::InvalidArgument(format!(
                "unknown compression: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_round_trips_for_every_kind() {
        for kind in [
            CompressionKind::None,
            CompressionKind::Gzip,
            CompressionKind::Bzip2,
        ] {
            assert_eq!(CompressionKind::from_filename(kind.extension()), Some(kind));
        }
    }

    #[test]
    fn longest_suffix_wins() {
        assert_eq!(
            CompressionKind::from_filename("db.sql.gz"),
            Some(CompressionKind::Gzip)
        );
        assert_eq!(
            CompressionKind::from_filename("db.sql.bz2"),
            Some(CompressionKind::Bzip2)
        );
        assert_eq!(
            CompressionKind::from_filename("db.sql"),
            Some(CompressionKind::None)
        );
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert_eq!(
            CompressionKind::from_filename("DB.SQL.GZ"),
            Some(CompressionKind::Gzip)
        );
        assert_eq!(
            CompressionKind::from_filename("Db.Sql"),
            Some(CompressionKind::None)
        );
    }

    #[test]
    fn unknown_suffixes_do_not_match() {
        for name in ["db.tar.gz", "db.sqlite", "db.sql.zip", "db", "sql"] {
            assert_eq!(CompressionKind::from_filename(name), None);
        }
        assert!(matches!(
            CompressionKind::resolve("db.tar.gz"),
            Err(BackupError::InvalidExtension(_))
        ));
    }

    #[test]
    fn bare_extension_without_stem_still_matches() {
        // ".sql" alone satisfies the suffix grammar
        assert_eq!(
            CompressionKind::from_filename(".sql"),
            Some(CompressionKind::None)
        );
    }

    #[test]
    fn user_selection_names() {
        assert_eq!(
            CompressionKind::from_name("gzip").unwrap(),
            CompressionKind::Gzip
        );
        assert_eq!(
            CompressionKind::from_name("bzip2").unwrap(),
            CompressionKind::Bzip2
        );
        assert_eq!(
            CompressionKind::from_name("none").unwrap(),
            CompressionKind::None
        );
        assert!(matches!(
            CompressionKind::from_name("zstd"),
            Err(BackupError::InvalidArgument(_))
        ));
    }
}
