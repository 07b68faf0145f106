//! Post models built from CMS documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rich_text::RichTextNode;
use crate::prismic::response::{ContentField, Document};

/// A post as shown in the listing. Only these five fields survive the
/// transform from the raw document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Slug, unique per post
    pub uid: String,

    pub first_publication_date: Option<DateTime<Utc>>,

    pub title: String,

    pub subtitle: String,

    pub author: String,
}

impl From<Document> for PostSummary {
    fn from(doc: Document) -> Self {
        Self {
            uid: doc.uid.unwrap_or_default(),
            first_publication_date: doc.first_publication_date,
            title: doc.data.title.unwrap_or_default(),
            subtitle: doc.data.subtitle.unwrap_or_default(),
            author: doc.data.author.unwrap_or_default(),
        }
    }
}

/// A full post, as rendered on its own page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,

    pub first_publication_date: Option<DateTime<Utc>>,

    pub title: String,

    pub subtitle: String,

    pub banner: Banner,

    pub author: String,

    /// Sections in source order, which is also render order
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub url: String,
}

/// A heading followed by its rich text body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body: Vec<RichTextNode>,
}

impl From<ContentField> for ContentBlock {
    fn from(field: ContentField) -> Self {
        Self {
            heading: field.heading.unwrap_or_default(),
            body: field.body,
        }
    }
}

impl From<Document> for PostDetail {
    fn from(doc: Document) -> Self {
        let data = doc.data;
        Self {
            uid: doc.uid.unwrap_or_default(),
            first_publication_date: doc.first_publication_date,
            title: data.title.unwrap_or_default(),
            subtitle: data.subtitle.unwrap_or_default(),
            banner: Banner {
                url: data.banner.and_then(|b| b.url).unwrap_or_default(),
            },
            author: data.author.unwrap_or_default(),
            content: data.content.into_iter().map(ContentBlock::from).collect(),
        }
    }
}

impl PostDetail {
    /// Estimated reading time in minutes
    pub fn reading_time(&self) -> u32 {
        super::reading_time::estimate_minutes(&self.content)
    }

    /// The summary view of this post
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            uid: self.uid.clone(),
            first_publication_date: self.first_publication_date,
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            author: self.author.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> Document {
        serde_json::from_str(
            r#"{
            "id": "YH2xQxIAACIAzEdt",
            "uid": "criando-um-app-cra-do-zero",
            "type": "posts",
            "first_publication_date": "2021-03-15T19:25:28+0000",
            "last_publication_date": "2021-03-25T19:25:28+0000",
            "tags": ["react"],
            "data": {
                "title": "Criando um app CRA do zero",
                "subtitle": "Tudo sobre como criar a sua primeira aplicação",
                "author": "Danilo Vieira",
                "banner": { "url": "https://images.prismic.io/banner.png" },
                "content": [
                    { "heading": "Proin et varius", "body": [{ "type": "paragraph", "text": "Lorem", "spans": [] }] },
                    { "heading": "Cras laoreet", "body": [] }
                ]
            }
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_summary_keeps_five_fields() {
        let summary = PostSummary::from(document());
        assert_eq!(summary.uid, "criando-um-app-cra-do-zero");
        assert_eq!(summary.title, "Criando um app CRA do zero");
        assert_eq!(summary.author, "Danilo Vieira");
        assert!(summary.first_publication_date.is_some());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_detail_preserves_content_order() {
        let detail = PostDetail::from(document());
        assert_eq!(detail.banner.url, "https://images.prismic.io/banner.png");
        let headings: Vec<_> = detail.content.iter().map(|c| c.heading.as_str()).collect();
        assert_eq!(headings, vec!["Proin et varius", "Cras laoreet"]);
        assert_eq!(detail.summary(), PostSummary::from(document()));
    }
}
