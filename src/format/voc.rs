//! Pascal-VOC-style XML sidecar codec.
//!
//! One XML file per image, with object records in the fixed field order
//! name, pose, truncated, difficult, bndbox.

use std::fs;
use std::io::Write;
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::format::error::FormatError;
use crate::format::store::find_image_for_stem;
use crate::format::traits::SidecarCodec;
use crate::model::{AnnotationSet, BoundingBox, DEFAULT_POSE, ImageSize, Label};

/// XML sidecar format.
///
/// Round-trips every [`Label`] field exactly; output is deterministically
/// indented so fixtures diff cleanly.
pub struct VocCodec;

impl SidecarCodec for VocCodec {
    fn id(&self) -> &'static str {
        "voc"
    }

    fn extension(&self) -> &'static str {
        "xml"
    }

    fn write(&self, set: &AnnotationSet, path: &Path) -> Result<(), FormatError> {
        log::debug!(
            "writing XML sidecar {:?} ({} label(s))",
            path,
            set.labels.len()
        );
        let content = build_xml(set)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn read(&self, path: &Path, _size: ImageSize) -> Result<AnnotationSet, FormatError> {
        parse_xml(path)
    }
}

/// Build the XML document for an annotation set.
fn build_xml(set: &AnnotationSet) -> Result<Vec<u8>, FormatError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
        .map_err(|e| FormatError::Xml(e.into()))?;

    writer
        .write_event(Event::Start(BytesStart::new("annotation")))
        .map_err(|e| FormatError::Xml(e.into()))?;

    let folder = set
        .image_path
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let filename = set
        .image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    write_text_element(&mut writer, "folder", &folder)?;
    write_text_element(&mut writer, "filename", &filename)?;
    write_text_element(&mut writer, "path", &set.image_path.to_string_lossy())?;

    writer
        .write_event(Event::Start(BytesStart::new("size")))
        .map_err(|e| FormatError::Xml(e.into()))?;
    write_text_element(&mut writer, "width", &set.size.width.to_string())?;
    write_text_element(&mut writer, "height", &set.size.height.to_string())?;
    write_text_element(&mut writer, "depth", &set.size.depth.to_string())?;
    writer
        .write_event(Event::End(BytesEnd::new("size")))
        .map_err(|e| FormatError::Xml(e.into()))?;

    for label in &set.labels {
        writer
            .write_event(Event::Start(BytesStart::new("object")))
            .map_err(|e| FormatError::Xml(e.into()))?;

        write_text_element(&mut writer, "name", &label.name)?;
        write_text_element(&mut writer, "pose", &label.pose)?;
        write_text_element(&mut writer, "truncated", &label.truncated.to_string())?;
        write_text_element(&mut writer, "difficult", &label.difficult.to_string())?;

        writer
            .write_event(Event::Start(BytesStart::new("bndbox")))
            .map_err(|e| FormatError::Xml(e.into()))?;
        write_text_element(&mut writer, "xmin", &label.bndbox.xmin.to_string())?;
        write_text_element(&mut writer, "ymin", &label.bndbox.ymin.to_string())?;
        write_text_element(&mut writer, "xmax", &label.bndbox.xmax.to_string())?;
        write_text_element(&mut writer, "ymax", &label.bndbox.ymax.to_string())?;
        writer
            .write_event(Event::End(BytesEnd::new("bndbox")))
            .map_err(|e| FormatError::Xml(e.into()))?;

        writer
            .write_event(Event::End(BytesEnd::new("object")))
            .map_err(|e| FormatError::Xml(e.into()))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("annotation")))
        .map_err(|e| FormatError::Xml(e.into()))?;

    Ok(writer.into_inner())
}

/// Write a simple text element.
fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), FormatError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(|e| FormatError::Xml(e.into()))?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(|e| FormatError::Xml(e.into()))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| FormatError::Xml(e.into()))?;
    Ok(())
}

/// Fields of the `<object>` element currently being parsed.
#[derive(Default)]
struct PartialObject {
    name: Option<String>,
    pose: Option<String>,
    truncated: u8,
    difficult: u8,
    xmin: Option<i32>,
    ymin: Option<i32>,
    xmax: Option<i32>,
    ymax: Option<i32>,
}

impl PartialObject {
    fn finish(self) -> Result<Label, FormatError> {
        let name = self.name.ok_or_else(|| FormatError::missing_field("object/name"))?;
        let bndbox = BoundingBox::from_legacy(
            self.xmin
                .ok_or_else(|| FormatError::missing_field("bndbox/xmin"))?,
            self.ymin
                .ok_or_else(|| FormatError::missing_field("bndbox/ymin"))?,
            self.xmax
                .ok_or_else(|| FormatError::missing_field("bndbox/xmax"))?,
            self.ymax
                .ok_or_else(|| FormatError::missing_field("bndbox/ymax"))?,
        );
        Ok(Label {
            name,
            pose: self.pose.unwrap_or_else(|| DEFAULT_POSE.to_string()),
            truncated: self.truncated,
            difficult: self.difficult,
            bndbox,
        })
    }
}

/// Parse an XML sidecar file.
fn parse_xml(path: &Path) -> Result<AnnotationSet, FormatError> {
    use quick_xml::Reader;

    let content = fs::read_to_string(path)?;
    let mut reader = Reader::from_str(&content);
    reader.trim_text(true);

    let mut filename = String::new();
    let mut image_path = String::new();
    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    let mut depth = 3u32;
    let mut labels = Vec::new();

    let mut current_element = String::new();
    let mut in_size = false;
    let mut in_bndbox = false;
    let mut object: Option<PartialObject> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "object" => object = Some(PartialObject::default()),
                    "bndbox" => in_bndbox = true,
                    "size" => in_size = true,
                    _ => {}
                }
                current_element = name;
            }
            Ok(Event::End(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "object" => {
                        if let Some(obj) = object.take() {
                            labels.push(obj.finish()?);
                        }
                    }
                    "bndbox" => in_bndbox = false,
                    "size" => in_size = false,
                    _ => {}
                }
                current_element.clear();
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();

                if in_size {
                    match current_element.as_str() {
                        "width" => width = text.parse().ok(),
                        "height" => height = text.parse().ok(),
                        "depth" => depth = text.parse().unwrap_or(3),
                        _ => {}
                    }
                } else if let Some(obj) = object.as_mut() {
                    if in_bndbox {
                        match current_element.as_str() {
                            "xmin" => obj.xmin = text.parse().ok(),
                            "ymin" => obj.ymin = text.parse().ok(),
                            "xmax" => obj.xmax = text.parse().ok(),
                            "ymax" => obj.ymax = text.parse().ok(),
                            _ => {}
                        }
                    } else {
                        match current_element.as_str() {
                            "name" => obj.name = Some(text),
                            "pose" => obj.pose = Some(text),
                            "truncated" => obj.truncated = text.parse().unwrap_or(0),
                            "difficult" => obj.difficult = text.parse().unwrap_or(0),
                            _ => {}
                        }
                    }
                } else {
                    match current_element.as_str() {
                        "filename" => filename = text,
                        "path" => image_path = text,
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FormatError::Xml(e.into())),
            _ => {}
        }
    }

    let width = width.ok_or_else(|| FormatError::missing_field("size/width"))?;
    let height = height.ok_or_else(|| FormatError::missing_field("size/height"))?;

    let folder = path.parent().unwrap_or(Path::new("."));
    let image_path = if !image_path.is_empty() {
        image_path.into()
    } else if !filename.is_empty() {
        folder.join(&filename)
    } else {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        find_image_for_stem(folder, stem).unwrap_or_default()
    };

    Ok(AnnotationSet {
        image_path,
        size: ImageSize::new(width, height, depth),
        labels,
    })
}
