//! Request vocabulary for the Bitwarden CLI.
//!
//! The CLI's `get` and `list` subcommands each accept a fixed set of
//! object words; these enums pin them down so a typo fails at compile
//! time instead of as an opaque subprocess error.

/// Target of a `bw get` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Item,
    Username,
    Password,
    Uri,
    Totp,
    Exposed,
    Attachment,
    Folder,
    Collection,
    Organization,
    OrgCollection,
    Template,
    Fingerprint,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Username => "username",
            Self::Password => "password",
            Self::Uri => "uri",
            Self::Totp => "totp",
            Self::Exposed => "exposed",
            Self::Attachment => "attachment",
            Self::Folder => "folder",
            Self::Collection => "collection",
            Self::Organization => "organization",
            Self::OrgCollection => "org-collection",
            Self::Template => "template",
            Self::Fingerprint => "fingerprint",
        }
    }

    /// Inverse of [`as_str`](Self::as_str); `None` for unknown words.
    pub fn parse(word: &str) -> Option<Self> {
        Some(match word {
            "item" => Self::Item,
            "username" => Self::Username,
            "password" => Self::Password,
            "uri" => Self::Uri,
            "totp" => Self::Totp,
            "exposed" => Self::Exposed,
            "attachment" => Self::Attachment,
            "folder" => Self::Folder,
            "collection" => Self::Collection,
            "organization" => Self::Organization,
            "org-collection" => Self::OrgCollection,
            "template" => Self::Template,
            "fingerprint" => Self::Fingerprint,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of a `bw list` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Items,
    Folders,
    Collections,
    Organizations,
    OrgCollections,
    OrgMembers,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Folders => "folders",
            Self::Collections => "collections",
            Self::Organizations => "organizations",
            Self::OrgCollections => "org-collections",
            Self::OrgMembers => "org-members",
        }
    }

    /// Inverse of [`as_str`](Self::as_str); `None` for unknown words.
    pub fn parse(word: &str) -> Option<Self> {
        Some(match word {
            "items" => Self::Items,
            "folders" => Self::Folders,
            "collections" => Self::Collections,
            "organizations" => Self::Organizations,
            "org-collections" => Self::OrgCollections,
            "org-members" => Self::OrgMembers,
            _ => return None,
        })
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional filters for `list`, rendered as CLI flags.
///
/// Only set filters produce arguments; the default renders to nothing.
/// Flag spellings follow the CLI (`--folderid`, not `--folder-id`).
#[derive(Debug, Clone, Default)]
pub struct ListFilters {
    pub search: Option<String>,
    pub url: Option<String>,
    pub folder_id: Option<String>,
    pub collection_id: Option<String>,
    pub organization_id: Option<String>,
    pub trash: bool,
}

impl ListFilters {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn folder_id(mut self, id: impl Into<String>) -> Self {
        self.folder_id = Some(id.into());
        self
    }

    pub fn collection_id(mut self, id: impl Into<String>) -> Self {
        self.collection_id = Some(id.into());
        self
    }

    pub fn organization_id(mut self, id: impl Into<String>) -> Self {
        self.organization_id = Some(id.into());
        self
    }

    pub fn trash(mut self, trash: bool) -> Self {
        self.trash = trash;
        self
    }

    /// Render to `--flag value` argument pairs.
    pub(crate) fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        for (flag, value) in [
            ("--search", &self.search),
            ("--url", &self.url),
            ("--folderid", &self.folder_id),
            ("--collectionid", &self.collection_id),
            ("--organizationid", &self.organization_id),
        ] {
            if let Some(value) = value {
                args.push(flag.to_string());
                args.push(value.clone());
            }
        }
        if self.trash {
            args.push("--trash".to_string());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filters_render_to_nothing() {
        assert!(ListFilters::default().to_args().is_empty());
    }

    #[test]
    fn url_filter_becomes_url_flag() {
        let args = ListFilters::default().url("github.com").to_args();
        assert_eq!(args, vec!["--url", "github.com"]);
    }

    #[test]
    fn filters_render_in_flag_value_pairs() {
        let args = ListFilters::default()
            .search("gh")
            .folder_id("f1")
            .trash(true)
            .to_args();
        assert_eq!(args, vec!["--search", "gh", "--folderid", "f1", "--trash"]);
    }

    #[test]
    fn field_words_round_trip() {
        for field in [
            Field::Item,
            Field::Username,
            Field::Password,
            Field::Uri,
            Field::Totp,
            Field::Exposed,
            Field::Attachment,
            Field::Folder,
            Field::Collection,
            Field::Organization,
            Field::OrgCollection,
            Field::Template,
            Field::Fingerprint,
        ] {
            assert_eq!(Field::parse(field.as_str()), Some(field));
        }
        assert_eq!(Field::parse("passwords"), None);
    }

    #[test]
    fn object_kind_words_round_trip() {
        for kind in [
            ObjectKind::Items,
            ObjectKind::Folders,
            ObjectKind::Collections,
            ObjectKind::Organizations,
            ObjectKind::OrgCollections,
            ObjectKind::OrgMembers,
        ] {
            assert_eq!(ObjectKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ObjectKind::parse("item"), None);
    }
}
