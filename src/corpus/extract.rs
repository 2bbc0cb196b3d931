//! Extraction of counts and result entries from parsed result pages.

use scraper::{ElementRef, Html, Node, Selector};
use serde::Serialize;

use crate::corpus::CorpusError;
use crate::models::ResultEntry;
use crate::utils::to_integer;

/// Parse a CSS selector, reporting failures as [`CorpusError::Parse`]
pub fn parse_selector(selector: &str) -> Result<Selector, CorpusError> {
    Selector::parse(selector)
        .map_err(|e| CorpusError::Parse(format!("Invalid selector {:?}: {}", selector, e)))
}

/// Number of matching documents and contexts shown on a result page.
///
/// The text of the first element matched by each selector is reduced to its
/// digits; a missing element or one without digits is an error.
pub fn counts(
    document: &Html,
    documents: &Selector,
    contexts: &Selector,
) -> Result<(u64, u64), CorpusError> {
    Ok((
        count_at(document, documents, "document")?,
        count_at(document, contexts, "context")?,
    ))
}

fn count_at(document: &Html, selector: &Selector, what: &str) -> Result<u64, CorpusError> {
    let element = document
        .select(selector)
        .next()
        .ok_or_else(|| CorpusError::Parse(format!("No {} count found in page", what)))?;

    let text: String = element.text().collect();
    Ok(to_integer(&text)?)
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultPage {
    entries: Vec<ResultEntry>,
}

impl ResultPage {
    /// Read the result list that follows the pager paragraph.
    ///
    /// A page without a pager, or without a list after it, has no results.
    pub fn parse(document: &Html, pager: &Selector) -> Self {
        let Some(pager) = document.select(pager).next() else {
            return Self::default();
        };

        let Some(list) = pager
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|e| e.value().name() == "ol")
        else {
            return Self::default();
        };

        let entries = list
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "li")
            .map(entry_from_item)
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn get(&self, idx: usize) -> Option<&ResultEntry> {
        self.entries.get(idx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultEntry> {
        self.entries.iter()
    }
}

impl IntoIterator for ResultPage {
    type Item = ResultEntry;
    type IntoIter = std::vec::IntoIter<ResultEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultPage {
    type Item = &'a ResultEntry;
    type IntoIter = std::slice::Iter<'a, ResultEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// The citation is the first non-blank child of the item.
fn entry_from_item(item: ElementRef) -> ResultEntry {
    let citation = item
        .children()
        .find_map(|node| match node.value() {
            Node::Text(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Node::Element(_) => ElementRef::wrap(node).map(|e| e.text().collect::<String>()),
            _ => None,
        })
        .unwrap_or_default();

    let text: String = item.text().collect();
    ResultEntry::new(collapse_whitespace(&citation), collapse_whitespace(&text))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_HTML: &str = r#"
<html><body>
<div class="content">
  <p class="found">Найдено <span>14 311</span> документов, <span>89 547</span> вхождений (<span>89 547</span>)</p>
  <p class="pager">Страницы: 1 2 3</p>
  <ol>
    <li><span class="b-doc-expl">В. Г. Распутин. Новая профессия (1998)</span>
        <ul><li>Он любил <b>читать</b> по вечерам.</li></ul></li>
    <li>
      Фридрих Горенштейн. Куча (1982) // «Октябрь», 1996
      <ul><li>Надо <b>читать</b> внимательно.</li></ul>
    </li>
  </ol>
</div>
</body></html>
"#;

    fn selectors() -> (Selector, Selector) {
        (
            parse_selector("body > div.content > p.found > span:nth-of-type(1)").unwrap(),
            parse_selector("body > div.content > p.found > span:nth-of-type(3)").unwrap(),
        )
    }

    #[test]
    fn test_counts() {
        let document = Html::parse_document(RESULTS_HTML);
        let (documents, contexts) = selectors();
        assert_eq!(counts(&document, &documents, &contexts).unwrap(), (14311, 89547));
    }

    #[test]
    fn test_counts_missing_element() {
        let document = Html::parse_document("<html><body><p>Ничего не найдено</p></body></html>");
        let (documents, contexts) = selectors();
        assert!(matches!(
            counts(&document, &documents, &contexts),
            Err(CorpusError::Parse(_))
        ));
    }

    #[test]
    fn test_counts_without_digits() {
        let document = Html::parse_document(
            r#"<html><body><div class="content"><p class="found"><span>—</span><span></span><span>—</span></p></div></body></html>"#,
        );
        let (documents, contexts) = selectors();
        assert!(matches!(
            counts(&document, &documents, &contexts),
            Err(CorpusError::Digits(_))
        ));
    }

    #[test]
    fn test_invalid_selector() {
        assert!(matches!(parse_selector("p[["), Err(CorpusError::Parse(_))));
    }

    #[test]
    fn test_result_page() {
        let document = Html::parse_document(RESULTS_HTML);
        let page = ResultPage::parse(&document, &parse_selector("p.pager").unwrap());

        assert_eq!(page.len(), 2);

        let first = page.get(0).unwrap();
        assert_eq!(
            first.citation.raw_name(),
            "В. Г. Распутин. Новая профессия (1998)"
        );
        assert_eq!(first.citation.date_middle(), 1998.0);
        assert!(first.text.contains("Он любил читать по вечерам."));

        let second = page.get(1).unwrap();
        assert_eq!(
            second.citation.raw_name(),
            "Фридрих Горенштейн. Куча (1982) // «Октябрь», 1996"
        );
        assert_eq!(second.citation.date_begin(), 1982.0);

        let names: Vec<&str> = page.iter().map(|e| e.citation.bare_name()).collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_result_page_without_pager() {
        let document = Html::parse_document("<html><body><ol><li>x</li></ol></body></html>");
        let page = ResultPage::parse(&document, &parse_selector("p.pager").unwrap());
        assert!(page.is_empty());
    }
}
