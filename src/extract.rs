//! Extraction of breadcrumb and child items from a rendered folder page.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::SelectorConfig;
use crate::error::{Error, Result};

/// What a child item links to, judged from its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A subfolder to recurse into.
    Folder,
    /// A file to download.
    File,
    /// Anything else; ignored by the walker.
    Other,
}

impl EntryKind {
    /// Classifies an item URL: `/folder` wins over `/file`.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        if url.contains("/folder") {
            Self::Folder
        } else if url.contains("/file") {
            Self::File
        } else {
            Self::Other
        }
    }
}

/// One item listed on a folder page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    /// Text of the item's main label.
    pub name: String,
    /// Item link resolved against the folder's origin.
    pub url: String,
    /// Classification of `url`.
    pub kind: EntryKind,
}

/// Everything read from one rendered folder page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPage {
    /// Breadcrumb labels, root first.
    pub breadcrumb: Vec<String>,
    /// Child items in document order.
    pub entries: Vec<ChildEntry>,
}

/// Resolves a root-relative item link against the origin of `folder_url`.
///
/// The result is `origin + href`, never a join against the folder path.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if `folder_url` does not parse or has an
/// opaque origin.
pub fn resolve_item_url(folder_url: &str, href: &str) -> Result<String> {
    let base = Url::parse(folder_url).map_err(|e| Error::InvalidUrl {
        url: folder_url.to_string(),
        reason: e.to_string(),
    })?;
    let origin = base.origin();
    if !origin.is_tuple() {
        return Err(Error::InvalidUrl {
            url: folder_url.to_string(),
            reason: "URL has no origin".to_string(),
        });
    }

    let origin = origin.ascii_serialization();
    if href.is_empty() || href.starts_with('/') {
        Ok(format!("{origin}{href}"))
    } else {
        Ok(format!("{origin}/{href}"))
    }
}

/// Compiled selectors for reading folder pages.
#[derive(Debug)]
pub struct PageExtractor {
    breadcrumb_item: Selector,
    breadcrumb_label: Selector,
    item_link: Selector,
    item_name: Selector,
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Selector(format!("{css}: {e}")))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

impl PageExtractor {
    /// Compiles the configured selectors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Selector`] if any selector is invalid.
    pub fn new(selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            breadcrumb_item: parse_selector(&selectors.breadcrumb_item)?,
            breadcrumb_label: parse_selector(&selectors.breadcrumb_label)?,
            item_link: parse_selector(&selectors.item_link)?,
            item_name: parse_selector(&selectors.item_name)?,
        })
    }

    /// Reads breadcrumb labels in root-first order.
    #[must_use]
    pub fn breadcrumb(&self, document: &Html) -> Vec<String> {
        document
            .select(&self.breadcrumb_item)
            .map(|item| {
                item.select(&self.breadcrumb_label)
                    .flat_map(|label| label.text())
                    .collect::<String>()
                    .trim()
                    .to_string()
            })
            .collect()
    }

    /// Reads child items in document order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `folder_url` cannot supply an origin.
    pub fn entries(&self, document: &Html, folder_url: &str) -> Result<Vec<ChildEntry>> {
        document
            .select(&self.item_link)
            .map(|link| {
                let href = link.value().attr("href").unwrap_or_default();
                let url = resolve_item_url(folder_url, href)?;
                let name = link
                    .select(&self.item_name)
                    .next()
                    .map(element_text)
                    .unwrap_or_default();
                Ok(ChildEntry {
                    name,
                    kind: EntryKind::from_url(&url),
                    url,
                })
            })
            .collect()
    }

    /// Parses `html` and extracts the breadcrumb and child items.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `folder_url` cannot supply an origin.
    pub fn extract(&self, html: &str, folder_url: &str) -> Result<FolderPage> {
        let document = Html::parse_document(html);
        Ok(FolderPage {
            breadcrumb: self.breadcrumb(&document),
            entries: self.entries(&document, folder_url)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOLDER_PAGE: &str = r#"
        <html><body>
          <div class="explorer-path-breadcrumb">
            <div class="explorer-path-breadcrumb-item">
              <a class="explorer-path-breadcrumb-item__link"><span>Drive</span></a>
            </div>
            <div class="explorer-path-breadcrumb-item">
              <a class="explorer-path-breadcrumb-item__link"><span>Photos</span></a>
            </div>
          </div>
          <ul>
            <li><a class="file-item-link" href="/drive/folder/sub1"><span type="main">sub</span><span>3 items</span></a></li>
            <li><a class="file-item-link" href="/file/abc"><span type="main">a.txt</span></a></li>
            <li><a class="file-item-link" href="/docx/xyz"><span type="main">notes</span></a></li>
          </ul>
        </body></html>
    "#;

    fn extractor() -> PageExtractor {
        PageExtractor::new(&SelectorConfig::default()).unwrap()
    }

    #[test]
    fn resolves_against_origin_not_folder_path() {
        assert_eq!(
            resolve_item_url("https://host/folder/abc", "/file/xyz").unwrap(),
            "https://host/file/xyz"
        );
    }

    #[test]
    fn resolve_keeps_port_and_drops_query() {
        assert_eq!(
            resolve_item_url("http://host:8080/folder/abc?x=1#frag", "/file/xyz").unwrap(),
            "http://host:8080/file/xyz"
        );
    }

    #[test]
    fn resolve_rejects_opaque_origin() {
        assert!(matches!(
            resolve_item_url("data:text/plain,hello", "/file/xyz"),
            Err(Error::InvalidUrl { .. })
        ));
        assert!(resolve_item_url("not a url", "/file/xyz").is_err());
    }

    #[test]
    fn classifies_by_url_shape() {
        assert_eq!(EntryKind::from_url("https://h/drive/folder/1"), EntryKind::Folder);
        assert_eq!(EntryKind::from_url("https://h/file/1"), EntryKind::File);
        assert_eq!(EntryKind::from_url("https://h/docx/1"), EntryKind::Other);
    }

    #[test]
    fn extracts_breadcrumb_in_order() {
        let page = extractor()
            .extract(FOLDER_PAGE, "https://host/drive/folder/root")
            .unwrap();
        assert_eq!(page.breadcrumb, vec!["Drive", "Photos"]);
    }

    #[test]
    fn breadcrumb_label_joins_every_match() {
        let selectors = SelectorConfig {
            breadcrumb_label: ".explorer-path-breadcrumb-item__link > span".to_string(),
            ..SelectorConfig::default()
        };
        let html = r#"
            <div class="explorer-path-breadcrumb">
              <div class="explorer-path-breadcrumb-item">
                <a class="explorer-path-breadcrumb-item__link"><span>Q3 </span><span>Report</span></a>
              </div>
            </div>
        "#;
        let page = PageExtractor::new(&selectors)
            .unwrap()
            .extract(html, "https://host/drive/folder/root")
            .unwrap();
        assert_eq!(page.breadcrumb, vec!["Q3 Report"]);
    }

    #[test]
    fn extracts_entries_in_document_order() {
        let page = extractor()
            .extract(FOLDER_PAGE, "https://host/drive/folder/root")
            .unwrap();
        assert_eq!(
            page.entries,
            vec![
                ChildEntry {
                    name: "sub".to_string(),
                    url: "https://host/drive/folder/sub1".to_string(),
                    kind: EntryKind::Folder,
                },
                ChildEntry {
                    name: "a.txt".to_string(),
                    url: "https://host/file/abc".to_string(),
                    kind: EntryKind::File,
                },
                ChildEntry {
                    name: "notes".to_string(),
                    url: "https://host/docx/xyz".to_string(),
                    kind: EntryKind::Other,
                },
            ]
        );
    }

    #[test]
    fn extraction_is_deterministic() {
        let ex = extractor();
        let first = ex.extract(FOLDER_PAGE, "https://host/drive/folder/root").unwrap();
        let second = ex.extract(FOLDER_PAGE, "https://host/drive/folder/root").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unexpected_shape_yields_empty_page() {
        let page = extractor()
            .extract("<html><body><p>loading</p></body></html>", "https://host/x")
            .unwrap();
        assert!(page.breadcrumb.is_empty());
        assert!(page.entries.is_empty());
    }

    #[test]
    fn invalid_selector_is_reported() {
        let selectors = SelectorConfig {
            item_link: "[[".to_string(),
            ..SelectorConfig::default()
        };
        assert!(matches!(
            PageExtractor::new(&selectors),
            Err(Error::Selector(_))
        ));
    }
}
