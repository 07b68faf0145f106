//! Raw payloads returned by the content API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::content::RichTextNode;

/// API root document, used to discover the master ref
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRoot {
    pub refs: Vec<ApiRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

impl ApiRoot {
    /// The ref pointing at the published content
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}

/// One page of a `documents/search` query
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub results_per_page: usize,
    #[serde(default)]
    pub results_size: usize,
    #[serde(default)]
    pub total_results_size: usize,
    #[serde(default)]
    pub total_pages: usize,
    pub next_page: Option<String>,
    pub prev_page: Option<String>,
    pub results: Vec<Document>,
}

/// A post document as stored in the CMS
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub id: String,
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default, deserialize_with = "deserialize_opt_date")]
    pub first_publication_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_opt_date")]
    pub last_publication_date: Option<DateTime<Utc>>,
    pub data: PostFields,
}

/// The `data` bag of a post document. Any field may be null in the CMS.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostFields {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
    pub banner: Option<BannerField>,
    pub content: Vec<ContentField>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BannerField {
    pub url: Option<String>,
    pub alt: Option<String>,
}

/// A group entry of the `content` slice: a heading and a rich text body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContentField {
    pub heading: Option<String>,
    pub body: Vec<RichTextNode>,
}

/// Prismic emits `2021-04-19T12:00:00+0000`, which is not RFC 3339.
fn deserialize_opt_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_date(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", s))),
    }
}

pub(crate) fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|d| d.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SEARCH: &str = r#"{
        "page": 1,
        "results_per_page": 1,
        "results_size": 1,
        "total_results_size": 3,
        "total_pages": 3,
        "next_page": "https://blog.cdn.prismic.io/api/v2/documents/search?ref=X&page=2&pageSize=1",
        "prev_page": null,
        "results": [{
            "id": "YH2xQxIAACIAzEdt",
            "uid": "como-utilizar-hooks",
            "type": "posts",
            "href": "https://blog.cdn.prismic.io/api/v2/documents/search?ref=X",
            "tags": [],
            "first_publication_date": "2021-04-19T17:12:00+0000",
            "last_publication_date": null,
            "lang": "pt-br",
            "data": {
                "title": "Como utilizar Hooks",
                "subtitle": "Pensando em sincronização em vez de ciclos de vida",
                "author": "Joseph Oliveira",
                "banner": { "url": "https://images.prismic.io/banner.png", "dimensions": {"width": 1, "height": 1} },
                "content": [{
                    "heading": "Proin et varius",
                    "body": [{ "type": "paragraph", "text": "Lorem ipsum", "spans": [] }]
                }]
            }
        }]
    }"#;

    #[test]
    fn test_parse_search_response() {
        let page: SearchResponse = serde_json::from_str(SEARCH).unwrap();
        assert_eq!(page.total_pages, 3);
        assert!(page.next_page.is_some());
        assert!(page.prev_page.is_none());

        let doc = &page.results[0];
        assert_eq!(doc.uid.as_deref(), Some("como-utilizar-hooks"));
        assert_eq!(doc.doc_type, "posts");
        assert_eq!(
            doc.first_publication_date,
            Some(Utc.with_ymd_and_hms(2021, 4, 19, 17, 12, 0).unwrap())
        );
        assert!(doc.last_publication_date.is_none());
        assert_eq!(doc.data.content.len(), 1);
        assert_eq!(doc.data.content[0].body[0].text.as_deref(), Some("Lorem ipsum"));
    }

    #[test]
    fn test_null_fields_are_tolerated() {
        let json = r#"{"id": "a", "uid": null, "type": "posts",
            "data": {"title": null, "subtitle": null, "author": null, "banner": null}}"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert!(doc.uid.is_none());
        assert!(doc.data.title.is_none());
        assert!(doc.data.content.is_empty());
    }

    #[test]
    fn test_master_ref() {
        let json = r#"{"refs": [
            {"id": "preview", "ref": "P1", "label": "Preview", "isMasterRef": false},
            {"id": "master", "ref": "YH2x", "label": "Master", "isMasterRef": true}
        ]}"#;
        let root: ApiRoot = serde_json::from_str(json).unwrap();
        assert_eq!(root.master_ref(), Some("YH2x"));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = Utc.with_ymd_and_hms(2021, 4, 19, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2021-04-19T00:00:00Z"), Some(expected));
        assert_eq!(parse_date("2021-04-19T00:00:00+0000"), Some(expected));
        assert_eq!(parse_date("2021-04-18T21:00:00-0300"), Some(expected));
        assert_eq!(parse_date("yesterday"), None);
    }
}
