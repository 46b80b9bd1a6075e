/// Owner and group of every synthetic entry.
pub const SERVICE_IDENTITY: &str = "jira";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Plan 9 style permission bits plus the directory flag.
pub struct FileMode(u32);

impl FileMode {
    pub const DIR: u32 = 0x8000_0000;

    pub const READ_ONLY: Self = Self(0o555);
    pub const READ_WRITE: Self = Self(0o777);
    pub const DIR_READ_ONLY: Self = Self(Self::DIR | 0o555);
    pub const DIR_READ_WRITE: Self = Self(Self::DIR | 0o777);

    pub const fn is_dir(self) -> bool {
        self.0 & Self::DIR != 0
    }

    pub const fn is_writable(self) -> bool {
        self.0 & 0o222 != 0
    }

    pub const fn permissions(self) -> u32 {
        self.0 & 0o777
    }
}

impl std::fmt::Display for FileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let perms = self.permissions();
        let mut out = String::with_capacity(10);
        out.push(if self.is_dir() { 'd' } else { '-' });
        for shift in [6, 3, 0] {
            let bits = (perms >> shift) & 0o7;
            out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
        }
        f.write_str(&out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One row of a directory listing.
pub struct DirEntry {
    pub name: String,
    pub mode: FileMode,
    pub owner: String,
    pub group: String,
}

impl DirEntry {
    pub fn new(name: &str, mode: FileMode) -> Self {
        Self {
            name: name.to_string(),
            mode,
            owner: SERVICE_IDENTITY.to_string(),
            group: SERVICE_IDENTITY.to_string(),
        }
    }
}

/// Turns names into listing entries that share one mode.
pub fn strings_to_entries<I, S>(names: I, mode: FileMode) -> Vec<DirEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| DirEntry::new(name.as_ref(), mode))
        .collect()
}
