use crate::core::{Profile, RenderedEntry, RssDocument};
use crate::core::renderer::profile_url;
use crate::utils::error::Result;
use crate::utils::text::format_rfc1123;
use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::HashSet;
use std::io::Cursor;

const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

/// 輸出頻道所需的設定
#[derive(Debug, Clone)]
pub struct ChannelOptions<'a> {
    pub handle: &'a str,
    pub out_path: &'a str,
    pub site_url: &'a str,
}

/// 正規化輸出路徑：反斜線轉斜線，處理 `.` 與 `..`，不會超出根目錄
pub fn normalize_output_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(part),
        }
    }
    segments.join("/")
}

pub fn self_link(site_url: &str, out_path: &str) -> Option<String> {
    if site_url.is_empty() {
        return None;
    }
    let base = site_url.strip_suffix('/').unwrap_or(site_url);
    Some(format!("{}/{}", base, normalize_output_path(out_path)))
}

pub fn build_document(
    profile: &Profile,
    entries: Vec<RenderedEntry>,
    options: &ChannelOptions<'_>,
    now: DateTime<Utc>,
) -> RssDocument {
    let handle = profile
        .handle
        .as_deref()
        .filter(|h| !h.is_empty())
        .unwrap_or(options.handle);

    let title = match profile.display_name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => format!("{} on Bluesky", name),
        None => format!("@{} on Bluesky", handle),
    };
    let description = profile
        .description
        .clone()
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("Posts from @{} on Bluesky", handle));

    RssDocument {
        title,
        link: profile_url(handle),
        description,
        last_build_date: format_rfc1123(&now),
        self_link: self_link(options.site_url, options.out_path),
        entries,
    }
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn write_text_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<()> {
    write_raw_element(writer, name, &escape(text))
}

/// `text` 必須已跳脫
fn write_raw_element(writer: &mut XmlWriter, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::from_escaped(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_item(writer: &mut XmlWriter, entry: &RenderedEntry) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("item")))?;
    write_text_element(writer, "title", &entry.title)?;
    write_text_element(writer, "link", &entry.link)?;

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "false"));
    writer.write_event(Event::Start(guid))?;
    writer.write_event(Event::Text(BytesText::from_escaped(escape(entry.guid.as_str()))))?;
    writer.write_event(Event::End(BytesEnd::new("guid")))?;

    write_text_element(writer, "pubDate", &entry.pub_date)?;

    let mut seen = HashSet::new();
    for tag in entry.tags.iter().filter(|tag| seen.insert(**tag)) {
        write_text_element(writer, "category", &tag.category())?;
    }

    // description 是 renderer 產生的 HTML 片段，原樣寫入
    write_raw_element(writer, "description", &entry.description)?;
    writer.write_event(Event::End(BytesEnd::new("item")))?;
    Ok(())
}

/// 組出完整的 RSS 2.0 文件字串
pub fn render_rss_xml(document: &RssDocument) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:atom", ATOM_NAMESPACE));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    write_text_element(&mut writer, "title", &document.title)?;
    write_text_element(&mut writer, "link", &document.link)?;
    write_text_element(&mut writer, "description", &document.description)?;
    write_text_element(&mut writer, "lastBuildDate", &document.last_build_date)?;

    if let Some(href) = &document.self_link {
        let mut atom_link = BytesStart::new("atom:link");
        atom_link.push_attribute(("href", href.as_str()));
        atom_link.push_attribute(("rel", "self"));
        atom_link.push_attribute(("type", "application/rss+xml"));
        writer.write_event(Event::Empty(atom_link))?;
    }

    for entry in &document.entries {
        write_item(&mut writer, entry)?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let mut xml = String::from_utf8_lossy(&writer.into_inner().into_inner()).into_owned();
    xml.push('\n');
    Ok(xml)
}
