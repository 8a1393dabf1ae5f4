use chrono::{DateTime, NaiveDateTime, Utc};
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder};

use crate::error::StoreError;
use crate::models::settings::SiteSettings;
use crate::posts;
use crate::store::Store;

const CHANNEL_DESCRIPTION: &str = "A personal blog";

/// Generate the RSS 2.0 document for all published posts, newest first.
/// `base_url` is scheme and host without a trailing slash.
pub fn generate_feed(store: &dyn Store, base_url: &str) -> Result<String, StoreError> {
    let site = SiteSettings::load(store)?;
    let published = posts::list_published(store)?;

    let items: Vec<rss::Item> = published
        .iter()
        .map(|post| {
            let url = format!("{}/{}", base_url, post.slug);
            let guid = GuidBuilder::default()
                .value(url.clone())
                .permalink(true)
                .build();
            ItemBuilder::default()
                .title(post.title.clone())
                .link(url)
                .guid(guid)
                .pub_date(format_rfc2822(post.created_at))
                .description(post.content.clone())
                .build()
        })
        .collect();

    let channel = ChannelBuilder::default()
        .title(site.blog_name)
        .link(base_url.to_string())
        .description(CHANNEL_DESCRIPTION.to_string())
        .items(items)
        .build();

    Ok(channel.to_string())
}

fn format_rfc2822(ndt: NaiveDateTime) -> String {
    let utc: DateTime<Utc> = DateTime::from_naive_utc_and_offset(ndt, Utc);
    utc.to_rfc2822()
}
