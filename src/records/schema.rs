//! Descriptors for every kind of record the server accepts.
//!
//! All kinds share one create/list/get implementation; what differs between
//! them (route, media folder, field names, how ids are minted) lives here.

/// Multipart field carrying the image for every kind
pub const IMAGE_PART: &str = "image";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// Sequential integer minted from the named counter
    Sequence { counter: &'static str },
    /// Random key generated by the server
    Generated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
}

const fn required(name: &'static str) -> FieldSpec {
    FieldSpec { name, required: true }
}

const fn optional(name: &'static str) -> FieldSpec {
    FieldSpec { name, required: false }
}

#[derive(Debug, PartialEq, Eq)]
pub struct RecordSchema {
    pub kind: &'static str,
    /// Path segment the kind is mounted under
    pub route: &'static str,
    /// Folder uploads of this kind are grouped in on the media host
    pub folder: &'static str,
    pub id_field: &'static str,
    pub id_strategy: IdStrategy,
    /// Field the media url is stored under
    pub media_field: &'static str,
    pub fields: &'static [FieldSpec],
}

impl RecordSchema {
    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.required).map(|f| f.name)
    }
}

pub static CAROUSEL: RecordSchema = RecordSchema {
    kind: "carousel",
    route: "/carousel",
    folder: "carousel",
    id_field: "id",
    id_strategy: IdStrategy::Generated,
    media_field: "image",
    fields: &[optional("title"), optional("link")],
};

pub static BLOG: RecordSchema = RecordSchema {
    kind: "blog",
    route: "/blogs",
    folder: "blogs",
    id_field: "blog_id",
    id_strategy: IdStrategy::Sequence { counter: "blog_id" },
    media_field: "blog_image",
    fields: &[required("blog_title"), required("blog_description")],
};

pub static EVENT: RecordSchema = RecordSchema {
    kind: "event",
    route: "/events",
    folder: "events",
    id_field: "id",
    id_strategy: IdStrategy::Generated,
    media_field: "image",
    fields: &[
        required("title"),
        required("date"),
        optional("description"),
        optional("link"),
    ],
};

pub static SONG: RecordSchema = RecordSchema {
    kind: "song",
    route: "/songs",
    folder: "songs",
    id_field: "id",
    id_strategy: IdStrategy::Generated,
    media_field: "image",
    fields: &[required("title"), required("link"), optional("description")],
};

pub static ALBUM: RecordSchema = RecordSchema {
    kind: "album",
    route: "/albums",
    folder: "albums",
    id_field: "id",
    id_strategy: IdStrategy::Generated,
    media_field: "image",
    fields: &[required("title"), required("link"), optional("date")],
};

pub static FEATURE: RecordSchema = RecordSchema {
    kind: "feature",
    route: "/features",
    folder: "features",
    id_field: "id",
    id_strategy: IdStrategy::Generated,
    media_field: "image",
    fields: &[required("title"), required("description"), optional("link")],
};

pub static ALL: [&RecordSchema; 6] = [&CAROUSEL, &BLOG, &EVENT, &SONG, &ALBUM, &FEATURE];
