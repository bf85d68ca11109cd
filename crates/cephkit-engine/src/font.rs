//! Label font lookup.
//!
//! Labels use a system sans-serif face found through fontdb. Hosts without
//! any usable face get no labels; geometry is drawn regardless.

use fontdb::{Database, Family, Query, Stretch, Style, Weight, ID};
use rusttype::Font;
use std::{fs, sync::OnceLock};

fn db() -> &'static Database {
    static DB: OnceLock<Database> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = Database::new();
        db.load_system_fonts();
        db
    })
}

/// Face used for landmark and annotation labels.
pub fn label_font() -> Option<&'static Font<'static>> {
    static FONT: OnceLock<Option<Font<'static>>> = OnceLock::new();
    FONT.get_or_init(|| {
        let query = Query {
            families: &[Family::SansSerif],
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let font = db()
            .query(&query)
            .and_then(load_face)
            .or_else(|| db().faces().find_map(|face| load_face(face.id)));
        if font.is_none() {
            tracing::warn!("No system font found; labels will not be drawn");
        }
        font
    })
    .as_ref()
}

fn load_face(id: ID) -> Option<Font<'static>> {
    let face = db().face(id)?;
    match &face.source {
        fontdb::Source::File(path) => {
            let bytes = fs::read(path).ok()?;
            Font::try_from_vec_and_index(bytes, face.index)
        }
        fontdb::Source::SharedFile(path, _) => {
            let bytes = fs::read(path).ok()?;
            Font::try_from_vec_and_index(bytes, face.index)
        }
        fontdb::Source::Binary(bytes) => {
            Font::try_from_vec_and_index(bytes.as_ref().as_ref().to_vec(), face.index)
        }
    }
}
