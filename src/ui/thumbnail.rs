use iced::widget::image::Handle;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use crate::state::data::SourceImage;

/// Image handles for every data URL currently on screen.
///
/// iced caches decoded images per handle, so handles are built once per
/// URL and kept until the URL disappears from the session.
#[derive(Default)]
pub struct ImageCache {
    handles: HashMap<String, Entry>,
}

struct Entry {
    handle: Handle,
    /// Pixel size read from the image header
    size: (u32, u32),
}

impl ImageCache {
    pub fn get(&self, url: &str) -> Option<&Handle> {
        self.handles.get(url).map(|entry| &entry.handle)
    }

    pub fn size(&self, url: &str) -> Option<(u32, u32)> {
        self.handles.get(url).map(|entry| entry.size)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Keep handles for `urls`, creating new ones and dropping the rest
    pub fn sync(&mut self, urls: impl IntoIterator<Item = String>) {
        let wanted: HashSet<String> = urls.into_iter().collect();
        self.handles.retain(|url, _| wanted.contains(url));

        for url in wanted {
            if self.handles.contains_key(&url) {
                continue;
            }
            match entry_for(&url) {
                Some(entry) => {
                    self.handles.insert(url, entry);
                }
                None => tracing::warn!("⚠️  Cannot display image ({} bytes of URL)", url.len()),
            }
        }
    }
}

fn entry_for(url: &str) -> Option<Entry> {
    let bytes = SourceImage::from_data_url(url).ok()?.decode().ok()?;
    let size = image::ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()?;
    Some(Entry {
        handle: Handle::from_bytes(bytes),
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_url(width: u32, height: u32) -> String {
        let img = image::RgbaImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        SourceImage::from_bytes(&out.into_inner()).unwrap().to_data_url()
    }

    #[test]
    fn test_sync_adds_and_drops() {
        let mut cache = ImageCache::default();
        let a = png_url(4, 3);
        let b = png_url(2, 2);

        cache.sync([a.clone(), b.clone(), "https://cdn.example.com/clip.mp4".to_string()]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.size(&a), Some((4, 3)));

        cache.sync([b.clone()]);
        assert!(cache.get(&a).is_none());
        assert!(cache.get(&b).is_some());
    }
}
