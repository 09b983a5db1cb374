use anyhow::Result;
use chrono::NaiveDate;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Leading indentation of a card inside the grid.
pub const CARD_INDENT: usize = 16;

/// One entry of the index page's article grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleCard {
    pub href: String,
    pub image: String,
    pub title: String,
    pub date: NaiveDate,
}

impl ArticleCard {
    pub fn new(href: String, image: String, title: String, date: NaiveDate) -> Self {
        ArticleCard {
            href,
            image,
            title,
            date,
        }
    }

    /// `data-date` value.
    pub fn data_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// Human-readable date, e.g. "January 15, 2024".
    pub fn display_date(&self) -> String {
        self.date.format("%B %d, %Y").to_string()
    }

    /// Render the card markup. Attribute and text values are escaped.
    pub fn to_html(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        let data_date = self.data_date();

        writer.write_event(Event::Start(BytesStart::new("a").with_attributes([
            ("href", self.href.as_str()),
            ("class", "article-card"),
            ("data-date", data_date.as_str()),
        ])))?;

        writer.write_event(Event::Start(
            BytesStart::new("div").with_attributes([("class", "article-image")]),
        ))?;
        writer.write_event(Event::Empty(BytesStart::new("img").with_attributes([
            ("src", self.image.as_str()),
            ("alt", self.title.as_str()),
        ])))?;
        writer.write_event(Event::End(BytesEnd::new("div")))?;

        writer.write_event(Event::Start(
            BytesStart::new("div").with_attributes([("class", "article-content")]),
        ))?;
        writer.write_event(Event::Start(BytesStart::new("h3")))?;
        writer.write_event(Event::Text(BytesText::new(&self.title)))?;
        writer.write_event(Event::End(BytesEnd::new("h3")))?;
        writer.write_event(Event::Start(
            BytesStart::new("p").with_attributes([("class", "article-date")]),
        ))?;
        writer.write_event(Event::Text(BytesText::new(&self.display_date())))?;
        writer.write_event(Event::End(BytesEnd::new("p")))?;
        writer.write_event(Event::End(BytesEnd::new("div")))?;

        writer.write_event(Event::End(BytesEnd::new("a")))?;

        Ok(String::from_utf8(writer.into_inner())?)
    }

    /// Card markup on a fresh line, indented to sit inside the grid.
    pub fn to_fragment(&self) -> Result<String> {
        let pad = " ".repeat(CARD_INDENT);
        let html = self.to_html()?;
        let mut fragment = String::new();
        for line in html.lines() {
            fragment.push('\n');
            fragment.push_str(&pad);
            fragment.push_str(line);
        }
        Ok(fragment)
    }
}
