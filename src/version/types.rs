//! Common types for the version domain

/// Release channel a version record was observed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Container image tags carrying archived Gemfile/lockfile pairs
    Gemfile,
    /// Snap store (one entry per revision, architecture and channel)
    Snap,
    /// Homebrew tap tags
    Homebrew,
    /// Chocolatey package feed
    Chocolatey,
    /// Packed single-binary releases
    Binary,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Gemfile,
        Channel::Snap,
        Channel::Homebrew,
        Channel::Chocolatey,
        Channel::Binary,
    ];

    /// Returns the string representation of the channel
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Gemfile => "gemfile",
            Channel::Snap => "snap",
            Channel::Homebrew => "homebrew",
            Channel::Chocolatey => "chocolatey",
            Channel::Binary => "binary",
        }
    }

    /// Human readable label used in listings
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Gemfile => "Ruby (Gemfile)",
            Channel::Snap => "Snap",
            Channel::Homebrew => "Homebrew",
            Channel::Chocolatey => "Chocolatey",
            Channel::Binary => "Binary",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for Channel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gemfile" => Ok(Channel::Gemfile),
            "snap" => Ok(Channel::Snap),
            "homebrew" => Ok(Channel::Homebrew),
            "chocolatey" => Ok(Channel::Chocolatey),
            "binary" => Ok(Channel::Binary),
            _ => Err(format!(
                "unknown channel '{s}'. Available: gemfile, snap, homebrew, chocolatey, binary"
            )),
        }
    }
}
