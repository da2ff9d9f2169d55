//! DIDL-Lite listings returned by ContentDirectory Browse and Search
//!
//! DIDL-Lite arrives as text inside the SOAP `Result` element, sometimes
//! escaped twice. Unlike the description documents this is parsed with
//! xmltree rather than serde: containers and items must be collected from any
//! depth, containers first, and child lookups must respect the DIDL-Lite,
//! Dublin Core and UPnP metadata namespaces.
//!
//! ```xml
//! <DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/"
//!            xmlns:dc="http://purl.org/dc/elements/1.1/"
//!            xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">
//!   <container id="1" parentID="0" restricted="1" childCount="12">
//!     <dc:title>Music</dc:title>
//!     <upnp:class>object.container.storageFolder</upnp:class>
//!   </container>
//!   <item id="1$4" parentID="1" restricted="1">
//!     <dc:title>Song</dc:title>
//!     <upnp:class>object.item.audioItem.musicTrack</upnp:class>
//!     <res protocolInfo="http-get:*:audio/mpeg:*" duration="0:03:58">http://host/song.mp3</res>
//!   </item>
//! </DIDL-Lite>
//! ```

use crate::common::xml_decode;
use crate::error::{ParseError, ParseResult};
use serde::Serialize;
use xmltree::Element;

pub const DIDL_NS: &str = "urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/";
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub const UPNP_NS: &str = "urn:schemas-upnp-org:metadata-1-0/upnp/";

/// A container or item from a DIDL-Lite listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaItem {
    pub id: String,
    pub parent_id: String,
    pub title: String,
    pub item_class: String,
    pub restricted: bool,
    pub is_container: bool,
    /// Only read for containers; unparsable values are `None`
    pub child_count: Option<u32>,
    pub resources: Vec<Resource>,
    pub metadata: MediaMetadata,
}

impl MediaItem {
    pub fn is_audio(&self) -> bool {
        self.item_class.contains("audioItem")
    }

    pub fn is_video(&self) -> bool {
        self.item_class.contains("videoItem")
    }

    /// URL of the first resource, if it has one
    pub fn first_resource_url(&self) -> Option<&str> {
        self.resources.first().and_then(|r| r.url.as_deref())
    }
}

/// A `<res>` element; attributes the server did not send stay `None`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_frequency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bits_per_sample: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nr_audio_channels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_depth: Option<String>,
}

/// Optional Dublin Core and UPnP descriptive fields, kept only when non-empty
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rights: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(rename = "albumArtURI", skip_serializing_if = "Option::is_none")]
    pub album_art_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_track_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_count: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_playback_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
}

impl MediaMetadata {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Parsed DIDL-Lite document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DidlLite {
    /// Containers in document order, followed by items in document order
    pub items: Vec<MediaItem>,
}

impl DidlLite {
    /// Parse DIDL-Lite text, unescaping it first when it is still escaped.
    ///
    /// # Returns
    ///
    /// The parsed listing, or an error if the text is not XML.
    pub fn from_xml(didl: &str) -> ParseResult<Self> {
        let text = xml_decode::unescape_markup(didl);
        let root = Element::parse(text.as_bytes())
            .map_err(|e| ParseError::InvalidXmlStructure(e.to_string()))?;

        let mut containers = Vec::new();
        collect(&root, "container", &mut containers);
        let mut leaves = Vec::new();
        collect(&root, "item", &mut leaves);

        let items = containers
            .into_iter()
            .map(|e| media_item(e, true))
            .chain(leaves.into_iter().map(|e| media_item(e, false)))
            .collect();

        Ok(Self { items })
    }
}

/// Parse DIDL-Lite text, yielding no items when it cannot be parsed
pub fn parse_items(didl: &str) -> Vec<MediaItem> {
    DidlLite::from_xml(didl)
        .map(|didl| didl.items)
        .unwrap_or_default()
}

/// Pre-order collection of DIDL-Lite elements called `name` below `elem`
fn collect<'a>(elem: &'a Element, name: &str, out: &mut Vec<&'a Element>) {
    for child in elem.children.iter().filter_map(|n| n.as_element()) {
        if child.name == name && child.namespace.as_deref() == Some(DIDL_NS) {
            out.push(child);
        }
        collect(child, name, out);
    }
}

fn child<'a>(elem: &'a Element, namespace: &str, name: &str) -> Option<&'a Element> {
    elem.children
        .iter()
        .filter_map(|n| n.as_element())
        .find(|c| c.name == name && c.namespace.as_deref() == Some(namespace))
}

/// Text of a direct child, `None` when missing or empty
fn child_text(elem: &Element, namespace: &str, name: &str) -> Option<String> {
    child(elem, namespace, name)
        .and_then(|c| c.get_text())
        .map(|t| t.into_owned())
        .filter(|t| !t.is_empty())
}

fn media_item(elem: &Element, is_container: bool) -> MediaItem {
    let attr = |name: &str| elem.attributes.get(name).cloned().unwrap_or_default();

    let child_count = if is_container {
        elem.attributes
            .get("childCount")
            .and_then(|cc| cc.trim().parse::<u32>().ok())
    } else {
        None
    };

    let resources = elem
        .children
        .iter()
        .filter_map(|n| n.as_element())
        .filter(|c| c.name == "res" && c.namespace.as_deref() == Some(DIDL_NS))
        .map(resource)
        .collect();

    MediaItem {
        id: attr("id"),
        parent_id: attr("parentID"),
        title: child_text(elem, DC_NS, "title").unwrap_or_default(),
        item_class: child_text(elem, UPNP_NS, "class").unwrap_or_default(),
        restricted: elem
            .attributes
            .get("restricted")
            .map_or(true, |r| r == "1"),
        is_container,
        child_count,
        resources,
        metadata: MediaMetadata {
            creator: child_text(elem, DC_NS, "creator"),
            date: child_text(elem, DC_NS, "date"),
            description: child_text(elem, DC_NS, "description"),
            publisher: child_text(elem, DC_NS, "publisher"),
            rights: child_text(elem, DC_NS, "rights"),
            artist: child_text(elem, UPNP_NS, "artist"),
            album: child_text(elem, UPNP_NS, "album"),
            genre: child_text(elem, UPNP_NS, "genre"),
            album_art_uri: child_text(elem, UPNP_NS, "albumArtURI"),
            original_track_number: child_text(elem, UPNP_NS, "originalTrackNumber"),
            playback_count: child_text(elem, UPNP_NS, "playbackCount"),
            last_playback_time: child_text(elem, UPNP_NS, "lastPlaybackTime"),
            rating: child_text(elem, UPNP_NS, "rating"),
        },
    }
}

fn resource(res: &Element) -> Resource {
    let attr = |name: &str| res.attributes.get(name).cloned();

    Resource {
        url: res.get_text().map(|t| t.trim().to_string()),
        protocol_info: attr("protocolInfo"),
        size: attr("size"),
        duration: attr("duration"),
        bitrate: attr("bitrate"),
        sample_frequency: attr("sampleFrequency"),
        bits_per_sample: attr("bitsPerSample"),
        nr_audio_channels: attr("nrAudioChannels"),
        resolution: attr("resolution"),
        color_depth: attr("colorDepth"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(body: &str) -> String {
        format!(
            r#"<DIDL-Lite xmlns="{}" xmlns:dc="{}" xmlns:upnp="{}">{}</DIDL-Lite>"#,
            DIDL_NS, DC_NS, UPNP_NS, body
        )
    }

    #[test]
    fn test_containers_come_before_items() {
        let xml = wrap(
            r#"<item id="I1" parentID="0"><dc:title>i1</dc:title></item>
               <container id="C1" parentID="0"><dc:title>c1</dc:title></container>
               <item id="I2" parentID="0"><dc:title>i2</dc:title></item>
               <container id="C2" parentID="0"><dc:title>c2</dc:title></container>"#,
        );

        let ids: Vec<_> = parse_items(&xml).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["C1", "C2", "I1", "I2"]);
    }

    #[test]
    fn test_restricted_defaults_to_true() {
        let xml = wrap(
            r#"<item id="a"/><item id="b" restricted="0"/><item id="c" restricted="1"/><item id="d" restricted="true"/>"#,
        );

        let restricted: Vec<_> = parse_items(&xml).into_iter().map(|i| i.restricted).collect();
        assert_eq!(restricted, vec![true, false, true, false]);
    }

    #[test]
    fn test_child_count_only_for_containers() {
        let xml = wrap(
            r#"<container id="a" childCount="7"/>
               <container id="b" childCount="lots"/>
               <item id="c" childCount="3"/>"#,
        );

        let items = parse_items(&xml);
        assert_eq!(items[0].child_count, Some(7));
        assert_eq!(items[1].child_count, None);
        assert_eq!(items[2].child_count, None);
        assert!(items[0].is_container && !items[2].is_container);
    }

    #[test]
    fn test_resource_attributes_and_url() {
        let xml = wrap(
            r#"<item id="t" parentID="1">
                 <dc:title>Track</dc:title>
                 <upnp:class>object.item.audioItem.musicTrack</upnp:class>
                 <res protocolInfo="http-get:*:audio/flac:*" size="1234" duration="0:01:00.000" sampleFrequency="44100">
                   http://10.0.0.2:8200/MediaItems/22.flac
                 </res>
                 <res protocolInfo="http-get:*:image/jpeg:*"></res>
               </item>"#,
        );

        let items = parse_items(&xml);
        let track = &items[0];
        assert!(track.is_audio());
        assert_eq!(track.resources.len(), 2);
        assert_eq!(
            track.first_resource_url(),
            Some("http://10.0.0.2:8200/MediaItems/22.flac")
        );
        assert_eq!(track.resources[0].size.as_deref(), Some("1234"));
        assert_eq!(track.resources[0].bitrate, None);
        assert_eq!(track.resources[1].url, None);

        let json = serde_json::to_value(&track.resources[1]).unwrap();
        assert_eq!(json, serde_json::json!({"protocolInfo": "http-get:*:image/jpeg:*"}));

        let json = serde_json::to_value(&track.resources[0]).unwrap();
        assert_eq!(json["sampleFrequency"], "44100");
        assert_eq!(json["protocolInfo"], "http-get:*:audio/flac:*");
        assert!(json.get("sample_frequency").is_none());
    }

    #[test]
    fn test_metadata_allow_list() {
        let xml = wrap(
            r#"<item id="t">
                 <dc:creator>Someone</dc:creator>
                 <dc:date></dc:date>
                 <upnp:album>Record</upnp:album>
                 <upnp:albumArtURI>http://x/art.jpg</upnp:albumArtURI>
                 <upnp:mood>happy</upnp:mood>
               </item>"#,
        );

        let metadata = &parse_items(&xml)[0].metadata;
        assert_eq!(metadata.creator.as_deref(), Some("Someone"));
        assert_eq!(metadata.date, None);
        assert_eq!(metadata.album.as_deref(), Some("Record"));
        assert_eq!(metadata.album_art_uri.as_deref(), Some("http://x/art.jpg"));
        assert!(!metadata.is_empty());
    }

    #[test]
    fn test_wrong_namespace_children_are_ignored() {
        let xml = format!(
            r#"<DIDL-Lite xmlns="{}"><item id="x"><title>bare</title><class>object.item</class></item></DIDL-Lite>"#,
            DIDL_NS
        );

        let items = parse_items(&xml);
        assert_eq!(items[0].title, "");
        assert_eq!(items[0].item_class, "");
    }

    #[test]
    fn test_escaped_didl_is_unescaped() {
        let escaped = wrap(r#"<item id="e"><dc:title>Rock &amp; Roll</dc:title></item>"#)
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;");

        let items = parse_items(&escaped);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Rock & Roll");
    }

    #[test]
    fn test_malformed_didl_yields_empty() {
        assert!(parse_items("<DIDL-Lite><item").is_empty());
        assert!(parse_items("").is_empty());
        assert!(DidlLite::from_xml("not xml").is_err());
    }
}
