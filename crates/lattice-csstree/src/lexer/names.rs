//! Vendor prefix and hack decomposition of identifiers and property names.

/// A keyword split into its vendor prefix and base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    /// Lowercased name without the vendor prefix.
    pub basename: String,
    /// Lowercased full name.
    pub name: String,
    /// Vendor prefix such as `-webkit-`, or empty.
    pub vendor: String,
    pub prefix: String,
    /// Starts with `--`.
    pub custom: bool,
}

/// A property name split into hack, vendor prefix and base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyName {
    pub basename: String,
    /// Lowercased name without the hack.
    pub name: String,
    /// One of `*`, `_`, `$`, `#`, `//`, or empty.
    pub hack: String,
    pub vendor: String,
    /// Hack followed by vendor prefix.
    pub prefix: String,
    pub custom: bool,
}

/// Whether `name` is a custom property or dashed identifier (`--x`).
pub fn is_custom_property(name: &str) -> bool {
    name.starts_with("--")
}

/// Vendor prefix of `name` starting at byte `offset`: a `-`, at least one
/// character, then the next `-`. Custom property names have none.
pub fn vendor_prefix(name: &str, offset: usize) -> &str {
    let Some(rest) = name.get(offset..) else {
        return "";
    };

    if !rest.starts_with('-') || rest.starts_with("--") {
        return "";
    }

    match rest.get(2..).and_then(|tail| tail.find('-')) {
        Some(index) => &rest[..index + 3],
        None => "",
    }
}

pub fn keyword(name: &str) -> Keyword {
    let name = name.to_lowercase();
    let custom = is_custom_property(&name);
    let vendor = if custom { "" } else { vendor_prefix(&name, 0) }.to_string();

    Keyword {
        basename: name[vendor.len()..].to_string(),
        vendor: vendor.clone(),
        prefix: vendor,
        custom,
        name,
    }
}

pub fn property(name: &str) -> PropertyName {
    let lower = name.to_lowercase();

    if is_custom_property(&lower) {
        return PropertyName {
            basename: lower.clone(),
            name: lower,
            hack: String::new(),
            vendor: String::new(),
            prefix: String::new(),
            custom: true,
        };
    }

    let hack = if lower.starts_with("//") {
        "//"
    } else {
        match lower.chars().next() {
            Some(ch @ ('*' | '_' | '$' | '#')) => &lower[..ch.len_utf8()],
            _ => "",
        }
    };
    let vendor = vendor_prefix(&lower, hack.len());

    PropertyName {
        basename: lower[hack.len() + vendor.len()..].to_string(),
        name: lower[hack.len()..].to_string(),
        prefix: format!("{hack}{vendor}"),
        hack: hack.to_string(),
        vendor: vendor.to_string(),
        custom: false,
    }
}
