use std::fmt;

/// The two services a media server session tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// ContentDirectory - exposes the media catalog (Browse, Search, ...)
    ContentDirectory,

    /// ConnectionManager - exposes supported transfer protocols and formats
    ConnectionManager,
}

impl ServiceKind {
    /// Get the name of this service as a string
    pub fn name(&self) -> &'static str {
        match self {
            ServiceKind::ContentDirectory => "ContentDirectory",
            ServiceKind::ConnectionManager => "ConnectionManager",
        }
    }

    /// Classify an advertised `serviceType` by substring
    ///
    /// ContentDirectory is tested first, so a type naming both is treated as
    /// ContentDirectory.
    pub fn classify(service_type: &str) -> Option<Self> {
        if service_type.contains(Self::ContentDirectory.name()) {
            Some(Self::ContentDirectory)
        } else if service_type.contains(Self::ConnectionManager.name()) {
            Some(Self::ConnectionManager)
        } else {
            None
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
