// src/pipeline/atom.rs

//! Atom serialization of derived feed views.

use atom_syndication::{Entry, Feed, FixedDateTime, Link, Person, Text};
use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::Item;
use crate::pipeline::query::FeedView;

impl FeedView {
    /// Render the view as an Atom document.
    pub fn to_atom(&self) -> Result<String> {
        let mut feed = Feed::default();
        feed.set_title(Text::plain(self.title.clone()));
        feed.set_id(self.link.clone());
        feed.set_links(vec![link(&self.link)]);
        feed.set_subtitle(Some(Text::plain(self.description.clone())));
        feed.set_updated(fixed(self.updated));
        feed.set_entries(
            self.items
                .iter()
                .map(|item| entry(item, self.updated))
                .collect::<Vec<_>>(),
        );

        let bytes = feed
            .write_to(Vec::new())
            .map_err(|e| AppError::Render(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| AppError::Render(e.to_string()))
    }
}

fn entry(item: &Item, feed_updated: DateTime<Utc>) -> Entry {
    let mut entry = Entry::default();
    entry.set_title(Text::plain(item.title.clone()));
    entry.set_id(item.id.clone());
    entry.set_links(vec![link(&item.link)]);
    entry.set_summary(Some(Text::plain(item.description.clone())));
    entry.set_published(item.created.map(fixed));
    entry.set_updated(fixed(item.updated.or(item.created).unwrap_or(feed_updated)));

    if !item.author.is_empty() {
        let mut author = Person::default();
        author.set_name(item.author.clone());
        entry.set_authors(vec![author]);
    }

    entry
}

fn link(href: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link
}

fn fixed(at: DateTime<Utc>) -> FixedDateTime {
    FixedDateTime::from(at)
}
