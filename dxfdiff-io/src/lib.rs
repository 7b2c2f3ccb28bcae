use std::fs;
use std::path::Path;

use thiserror::Error;

use dxfdiff_core::document::{
    Arc, Circle, DEFAULT_LAYER, DEFAULT_LINETYPE, Document, Entity, Generic, Leader, Line, MText,
    Text,
};
use dxfdiff_core::geometry::Point2;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<Document, IoError>;
}

pub trait DocumentSaver {
    fn save(&self, document: &Document, path: &Path) -> Result<(), IoError>;
}

/// DXF 读写门面：ASCII DXF 的加载与保存。
pub struct DxfFacade;

impl DxfFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DxfFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for DxfFacade {
    fn load(&self, path: &Path) -> Result<Document, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let parser = DxfParser::new(&data);
        parser
            .parse()
            .map_err(|DxfError::Invalid { message }| IoError::InvalidDocument(message))
    }
}

impl DocumentSaver for DxfFacade {
    fn save(&self, document: &Document, path: &Path) -> Result<(), IoError> {
        let data = render_document(document);
        fs::write(path, data).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug)]
enum DxfError {
    Invalid { message: String },
}

impl DxfError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// ENTITIES 段解析器。六种已映射实体之外的类型一律落为 Generic，
/// 保证差分输入不会因陌生实体而中断。
struct DxfParser<'a> {
    reader: DxfReader<'a>,
}

impl<'a> DxfParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            reader: DxfReader::new(source),
        }
    }

    fn parse(mut self) -> Result<Document, DxfError> {
        let mut document = Document::new();
        while let Some((code, value)) = self.reader.next_pair()? {
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "意外的组码 {code}（期望 0 表示 SECTION/EOF）"
                )));
            }
            match value.as_str() {
                "SECTION" => {
                    let (name_code, name) = self
                        .reader
                        .next_pair()?
                        .ok_or_else(|| DxfError::invalid("SECTION 缺少名称（组码 2）"))?;
                    if name_code != 2 {
                        return Err(DxfError::invalid(format!(
                            "SECTION 名称使用了组码 {name_code}（期望 2）"
                        )));
                    }
                    match name.as_str() {
                        "ENTITIES" => self.parse_entities(&mut document)?,
                        _ => self.skip_section()?,
                    }
                }
                "EOF" => break,
                unexpected => {
                    return Err(DxfError::invalid(format!(
                        "意外的标记 {unexpected}，期望 SECTION 或 EOF"
                    )));
                }
            }
        }
        Ok(document)
    }

    fn skip_section(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value == "ENDSEC" => break,
                Some(_) => continue,
                None => {
                    return Err(DxfError::invalid("SECTION 未找到 ENDSEC 终止标记"));
                }
            }
        }
        Ok(())
    }

    fn parse_entities(&mut self, document: &mut Document) -> Result<(), DxfError> {
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(DxfError::invalid("ENTITIES 段提前结束")),
            };
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "ENTITIES 段遇到组码 {code}（期望 0 表示实体起始）"
                )));
            }

            match value.as_str() {
                "ENDSEC" => break,
                "SEQEND" => {
                    self.skip_entity_body()?;
                }
                entity => {
                    let parsed = self.parse_entity(entity)?;
                    document.add_entity(parsed);
                }
            }
        }
        Ok(())
    }

    fn parse_entity(&mut self, kind: &str) -> Result<Entity, DxfError> {
        match kind {
            "LINE" => self.parse_line(),
            "CIRCLE" => self.parse_circle(),
            "ARC" => self.parse_arc(),
            "TEXT" => self.parse_text(),
            "MTEXT" => self.parse_mtext(),
            "LEADER" => self.parse_leader(),
            other => self.parse_generic(other),
        }
    }

    fn parse_line(&mut self) -> Result<Entity, DxfError> {
        let mut layer = None;
        let mut linetype = None;
        let mut start_x = None;
        let mut start_y = None;
        let mut end_x = None;
        let mut end_y = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    6 => linetype = Some(value.trim().to_string()),
                    10 => {
                        if start_x.is_some() {
                            return Err(DxfError::invalid("LINE 遇到重复的起点 X（组码 10）"));
                        }
                        start_x = Some(parse_f64(&value, "LINE 起点 X")?);
                    }
                    20 => {
                        if start_y.is_some() {
                            return Err(DxfError::invalid("LINE 遇到重复的起点 Y（组码 20）"));
                        }
                        start_y = Some(parse_f64(&value, "LINE 起点 Y")?);
                    }
                    11 => {
                        if end_x.is_some() {
                            return Err(DxfError::invalid("LINE 遇到重复的终点 X（组码 11）"));
                        }
                        end_x = Some(parse_f64(&value, "LINE 终点 X")?);
                    }
                    21 => {
                        if end_y.is_some() {
                            return Err(DxfError::invalid("LINE 遇到重复的终点 Y（组码 21）"));
                        }
                        end_y = Some(parse_f64(&value, "LINE 终点 Y")?);
                    }
                    30 | 31 => {} // 忽略 Z 坐标
                    _ => {}
                },
                None => return Err(DxfError::invalid("LINE 未正确结束")),
            }
        }

        let layer = layer.unwrap_or_else(|| DEFAULT_LAYER.to_string());
        let linetype = linetype.unwrap_or_else(|| DEFAULT_LINETYPE.to_string());
        let sx = start_x.ok_or_else(|| DxfError::invalid("LINE 缺少起点 X（组码 10）"))?;
        let sy = start_y.ok_or_else(|| DxfError::invalid("LINE 缺少起点 Y（组码 20）"))?;
        let ex = end_x.ok_or_else(|| DxfError::invalid("LINE 缺少终点 X（组码 11）"))?;
        let ey = end_y.ok_or_else(|| DxfError::invalid("LINE 缺少终点 Y（组码 21）"))?;

        Ok(Entity::Line(Line {
            start: Point2::new(sx, sy),
            end: Point2::new(ex, ey),
            layer,
            linetype,
        }))
    }

    fn parse_circle(&mut self) -> Result<Entity, DxfError> {
        let mut layer = None;
        let mut linetype = None;
        let mut center_x = None;
        let mut center_y = None;
        let mut radius = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    6 => linetype = Some(value.trim().to_string()),
                    10 => {
                        if center_x.is_some() {
                            return Err(DxfError::invalid("CIRCLE 遇到重复的圆心 X（组码 10）"));
                        }
                        center_x = Some(parse_f64(&value, "CIRCLE 圆心 X")?);
                    }
                    20 => {
                        if center_y.is_some() {
                            return Err(DxfError::invalid("CIRCLE 遇到重复的圆心 Y（组码 20）"));
                        }
                        center_y = Some(parse_f64(&value, "CIRCLE 圆心 Y")?);
                    }
                    40 => {
                        if radius.is_some() {
                            return Err(DxfError::invalid("CIRCLE 遇到重复的半径（组码 40）"));
                        }
                        radius = Some(parse_f64(&value, "CIRCLE 半径")?);
                    }
                    30 => {}
                    _ => {}
                },
                None => return Err(DxfError::invalid("CIRCLE 未正确结束")),
            }
        }

        let layer = layer.unwrap_or_else(|| DEFAULT_LAYER.to_string());
        let linetype = linetype.unwrap_or_else(|| DEFAULT_LINETYPE.to_string());
        let cx = center_x.ok_or_else(|| DxfError::invalid("CIRCLE 缺少圆心 X（组码 10）"))?;
        let cy = center_y.ok_or_else(|| DxfError::invalid("CIRCLE 缺少圆心 Y（组码 20）"))?;
        let radius = radius.ok_or_else(|| DxfError::invalid("CIRCLE 缺少半径（组码 40）"))?;

        Ok(Entity::Circle(Circle {
            center: Point2::new(cx, cy),
            radius,
            layer,
            linetype,
        }))
    }

    fn parse_arc(&mut self) -> Result<Entity, DxfError> {
        let mut layer = None;
        let mut linetype = None;
        let mut center_x = None;
        let mut center_y = None;
        let mut radius = None;
        let mut start_angle = None;
        let mut end_angle = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    6 => linetype = Some(value.trim().to_string()),
                    10 => {
                        if center_x.is_some() {
                            return Err(DxfError::invalid("ARC 遇到重复的圆心 X（组码 10）"));
                        }
                        center_x = Some(parse_f64(&value, "ARC 圆心 X")?);
                    }
                    20 => {
                        if center_y.is_some() {
                            return Err(DxfError::invalid("ARC 遇到重复的圆心 Y（组码 20）"));
                        }
                        center_y = Some(parse_f64(&value, "ARC 圆心 Y")?);
                    }
                    40 => {
                        if radius.is_some() {
                            return Err(DxfError::invalid("ARC 遇到重复的半径（组码 40）"));
                        }
                        radius = Some(parse_f64(&value, "ARC 半径")?);
                    }
                    50 => {
                        if start_angle.is_some() {
                            return Err(DxfError::invalid("ARC 遇到重复的起始角（组码 50）"));
                        }
                        start_angle = Some(parse_f64(&value, "ARC 起始角")?.to_radians());
                    }
                    51 => {
                        if end_angle.is_some() {
                            return Err(DxfError::invalid("ARC 遇到重复的终止角（组码 51）"));
                        }
                        end_angle = Some(parse_f64(&value, "ARC 终止角")?.to_radians());
                    }
                    30 => {}
                    _ => {}
                },
                None => return Err(DxfError::invalid("ARC 未正确结束")),
            }
        }

        let layer = layer.unwrap_or_else(|| DEFAULT_LAYER.to_string());
        let linetype = linetype.unwrap_or_else(|| DEFAULT_LINETYPE.to_string());
        let cx = center_x.ok_or_else(|| DxfError::invalid("ARC 缺少圆心 X（组码 10）"))?;
        let cy = center_y.ok_or_else(|| DxfError::invalid("ARC 缺少圆心 Y（组码 20）"))?;
        let radius = radius.ok_or_else(|| DxfError::invalid("ARC 缺少半径（组码 40）"))?;
        let start_angle =
            start_angle.ok_or_else(|| DxfError::invalid("ARC 缺少起始角（组码 50）"))?;
        let end_angle = end_angle.ok_or_else(|| DxfError::invalid("ARC 缺少终止角（组码 51）"))?;

        Ok(Entity::Arc(Arc {
            center: Point2::new(cx, cy),
            radius,
            start_angle,
            end_angle,
            layer,
            linetype,
        }))
    }

    fn parse_text(&mut self) -> Result<Entity, DxfError> {
        let mut layer = None;
        let mut insert_x = None;
        let mut insert_y = None;
        let mut height = None;
        let mut rotation_deg = 0.0;
        let mut text: Option<String> = None;
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    10 => {
                        if insert_x.is_some() {
                            return Err(DxfError::invalid("TEXT 遇到重复的插入点 X（组码 10）"));
                        }
                        insert_x = Some(parse_f64(&value, "TEXT 插入点 X")?);
                    }
                    20 => {
                        if insert_y.is_some() {
                            return Err(DxfError::invalid("TEXT 遇到重复的插入点 Y（组码 20）"));
                        }
                        insert_y = Some(parse_f64(&value, "TEXT 插入点 Y")?);
                    }
                    30 => {}
                    40 => {
                        if height.is_some() {
                            return Err(DxfError::invalid("TEXT 遇到重复的文字高度（组码 40）"));
                        }
                        height = Some(parse_f64(&value, "TEXT 高度")?);
                    }
                    50 => {
                        rotation_deg = parse_f64(&value, "TEXT 旋转角")?;
                    }
                    1 => {
                        let entry = value;
                        match text {
                            Some(ref mut existing) => {
                                existing.push('\n');
                                existing.push_str(&entry);
                            }
                            None => text = Some(entry),
                        }
                    }
                    6 | 7 | 72 | 73 | 100 | 11 | 21 => {
                        // 目前忽略：线型、文字样式、对齐信息等
                    }
                    _ => {}
                },
                None => return Err(DxfError::invalid("TEXT 未正确结束")),
            }
        }

        let layer = layer.unwrap_or_else(|| DEFAULT_LAYER.to_string());
        let ix = insert_x.ok_or_else(|| DxfError::invalid("TEXT 缺少插入点 X（组码 10）"))?;
        let iy = insert_y.ok_or_else(|| DxfError::invalid("TEXT 缺少插入点 Y（组码 20）"))?;
        let height = height.ok_or_else(|| DxfError::invalid("TEXT 缺少文字高度（组码 40）"))?;
        let content = text.ok_or_else(|| DxfError::invalid("TEXT 缺少文本内容（组码 1）"))?;

        Ok(Entity::Text(Text {
            insert: Point2::new(ix, iy),
            content,
            height,
            rotation: rotation_deg.to_radians(),
            layer,
        }))
    }

    fn parse_mtext(&mut self) -> Result<Entity, DxfError> {
        let mut layer = None;
        let mut insert_x = None;
        let mut insert_y = None;
        let mut height = None;
        let mut reference_width: Option<f64> = None;
        let mut fragments: Vec<String> = Vec::new();

        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    10 => {
                        if insert_x.is_some() {
                            return Err(DxfError::invalid("MTEXT 遇到重复的插入点 X（组码 10）"));
                        }
                        insert_x = Some(parse_f64(&value, "MTEXT 插入点 X")?);
                    }
                    20 => {
                        if insert_y.is_some() {
                            return Err(DxfError::invalid("MTEXT 遇到重复的插入点 Y（组码 20）"));
                        }
                        insert_y = Some(parse_f64(&value, "MTEXT 插入点 Y")?);
                    }
                    30 => {}
                    40 => {
                        if height.is_some() {
                            return Err(DxfError::invalid("MTEXT 遇到重复的文本高度（组码 40）"));
                        }
                        height = Some(parse_f64(&value, "MTEXT 高度")?);
                    }
                    41 => {
                        let width = parse_f64(&value, "MTEXT 参考宽度")?;
                        reference_width = if width.abs() < f64::EPSILON {
                            None
                        } else {
                            Some(width)
                        };
                    }
                    1 | 3 => {
                        fragments.push(value);
                    }
                    6 | 7 | 11 | 21 | 31 | 50 | 71 | 72 | 73 | 100 | 101 | 102 | 210 | 220
                    | 230 | 44 => {
                        // 样式、方向向量、附着点等字段当前未映射
                    }
                    _ => {}
                },
                None => return Err(DxfError::invalid("MTEXT 未正确结束")),
            }
        }

        let layer = layer.unwrap_or_else(|| DEFAULT_LAYER.to_string());
        let ix = insert_x.ok_or_else(|| DxfError::invalid("MTEXT 缺少插入点 X（组码 10）"))?;
        let iy = insert_y.ok_or_else(|| DxfError::invalid("MTEXT 缺少插入点 Y（组码 20）"))?;
        let height = height.ok_or_else(|| DxfError::invalid("MTEXT 缺少文本高度（组码 40）"))?;
        if fragments.is_empty() {
            return Err(DxfError::invalid("MTEXT 缺少内容（组码 1/3）"));
        }

        let decoded_text = fragments
            .into_iter()
            .map(|frag| decode_mtext_content(&frag))
            .collect::<String>();

        Ok(Entity::MText(MText {
            insert: Point2::new(ix, iy),
            content: decoded_text,
            height,
            width: reference_width,
            layer,
        }))
    }

    fn parse_leader(&mut self) -> Result<Entity, DxfError> {
        let mut layer = None;
        let mut linetype = None;
        let mut pending_x: Option<f64> = None;
        let mut vertices: Vec<Point2> = Vec::new();

        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    6 => linetype = Some(value.trim().to_string()),
                    10 => {
                        if pending_x.is_some() {
                            return Err(DxfError::invalid(
                                "LEADER 顶点 X（组码 10）重复出现且缺少对应的组码 20",
                            ));
                        }
                        pending_x = Some(parse_f64(&value, "LEADER 顶点 X（组码 10）")?);
                    }
                    20 => {
                        let x = pending_x.take().ok_or_else(|| {
                            DxfError::invalid("LEADER 顶点 Y（组码 20）出现前缺少组码 10")
                        })?;
                        let y = parse_f64(&value, "LEADER 顶点 Y（组码 20）")?;
                        vertices.push(Point2::new(x, y));
                    }
                    _ => {}
                },
                None => return Err(DxfError::invalid("LEADER 未正确结束")),
            }
        }

        if pending_x.is_some() {
            return Err(DxfError::invalid(
                "LEADER 读取完毕时缺少最后一个顶点的组码 20",
            ));
        }

        let layer = layer.unwrap_or_else(|| DEFAULT_LAYER.to_string());
        let linetype = linetype.unwrap_or_else(|| DEFAULT_LINETYPE.to_string());
        Ok(Entity::Leader(Leader {
            layer,
            linetype,
            vertices,
        }))
    }

    /// 未映射实体的兜底解析：只抓取图层、线型与第一个完整的 10/20
    /// 坐标对（作为插入点），其余字段全部跳过、绝不报错。
    fn parse_generic(&mut self, kind: &str) -> Result<Entity, DxfError> {
        let mut layer = None;
        let mut linetype = None;
        let mut pending_x: Option<f64> = None;
        let mut insert: Option<Point2> = None;

        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => match code {
                    8 => layer = Some(value.trim().to_string()),
                    6 => linetype = Some(value.trim().to_string()),
                    10 if insert.is_none() => {
                        pending_x = parse_f64(&value, "实体插入点 X").ok();
                    }
                    20 if insert.is_none() => {
                        if let (Some(x), Ok(y)) = (pending_x.take(), value.trim().parse::<f64>()) {
                            insert = Some(Point2::new(x, y));
                        }
                    }
                    _ => {}
                },
                None => return Err(DxfError::invalid(format!("{kind} 未正确结束"))),
            }
        }

        let layer = layer.unwrap_or_else(|| DEFAULT_LAYER.to_string());
        let linetype = linetype.unwrap_or_else(|| DEFAULT_LINETYPE.to_string());
        Ok(Entity::Generic(Generic {
            entity_type: kind.to_string(),
            layer,
            linetype,
            insert,
        }))
    }

    fn skip_entity_body(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some(_) => continue,
                None => break,
            }
        }
        Ok(())
    }
}

struct DxfReader<'a> {
    lines: std::str::Lines<'a>,
    buffer: Option<(i32, String)>,
    line_number: usize,
}

impl<'a> DxfReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            buffer: None,
            line_number: 0,
        }
    }

    fn next_pair(&mut self) -> Result<Option<(i32, String)>, DxfError> {
        if let Some(pair) = self.buffer.take() {
            return Ok(Some(pair));
        }

        let code_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => return Ok(None),
        };

        let value_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => {
                return Err(DxfError::invalid(format!(
                    "文件在第 {} 行结束，缺少与组码对应的值行",
                    self.line_number
                )));
            }
        };

        let code = code_line.trim().parse::<i32>().map_err(|_| {
            DxfError::invalid(format!(
                "第 {} 行的组码 \"{}\" 无法解析为整数",
                self.line_number - 1,
                code_line.trim()
            ))
        })?;
        let value = value_line.trim_end_matches('\r').to_string();
        Ok(Some((code, value)))
    }

    fn put_back(&mut self, pair: (i32, String)) {
        if self.buffer.is_some() {
            panic!("内部错误：尝试多次回退 DXF pair");
        }
        self.buffer = Some(pair);
    }
}

fn parse_f64(raw: &str, context: &str) -> Result<f64, DxfError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| DxfError::invalid(format!("{context} 解析失败（值：\"{raw}\"）")))
}

fn decode_mtext_content(raw: &str) -> String {
    let mut result = String::new();
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('P') | Some('p') => result.push('\n'),
                Some('~') => result.push(' '),
                Some('\\') => result.push('\\'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(ch);
        }
    }
    result
}

fn encode_mtext_content(raw: &str) -> String {
    let mut result = String::new();
    for ch in raw.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\P"),
            other => result.push(other),
        }
    }
    result
}

/// 把文档渲染为 ASCII DXF 文本：TABLES 段写图层表（含 ACI 颜色），
/// ENTITIES 段按文档内顺序写实体，末尾 EOF。
fn render_document(document: &Document) -> String {
    let mut out = String::new();

    emit(&mut out, 0, "SECTION");
    emit(&mut out, 2, "TABLES");
    emit(&mut out, 0, "TABLE");
    emit(&mut out, 2, "LAYER");

    let mut layers: Vec<_> = document.layers().collect();
    layers.sort_by(|a, b| a.name.cmp(&b.name));
    emit(&mut out, 70, layers.len());
    for layer in layers {
        emit(&mut out, 0, "LAYER");
        emit(&mut out, 2, &layer.name);
        emit(&mut out, 70, 0);
        emit(&mut out, 62, layer.color);
        emit(&mut out, 6, "Continuous");
    }
    emit(&mut out, 0, "ENDTAB");
    emit(&mut out, 0, "ENDSEC");

    emit(&mut out, 0, "SECTION");
    emit(&mut out, 2, "ENTITIES");
    for (_, entity) in document.entities() {
        render_entity(&mut out, entity);
    }
    emit(&mut out, 0, "ENDSEC");
    emit(&mut out, 0, "EOF");

    out
}

fn render_entity(out: &mut String, entity: &Entity) {
    match entity {
        Entity::Line(line) => {
            emit(out, 0, "LINE");
            emit(out, 8, &line.layer);
            emit(out, 6, &line.linetype);
            emit(out, 10, line.start.x());
            emit(out, 20, line.start.y());
            emit(out, 11, line.end.x());
            emit(out, 21, line.end.y());
        }
        Entity::Circle(circle) => {
            emit(out, 0, "CIRCLE");
            emit(out, 8, &circle.layer);
            emit(out, 6, &circle.linetype);
            emit(out, 10, circle.center.x());
            emit(out, 20, circle.center.y());
            emit(out, 40, circle.radius);
        }
        Entity::Arc(arc) => {
            emit(out, 0, "ARC");
            emit(out, 8, &arc.layer);
            emit(out, 6, &arc.linetype);
            emit(out, 10, arc.center.x());
            emit(out, 20, arc.center.y());
            emit(out, 40, arc.radius);
            emit(out, 50, arc.start_angle.to_degrees());
            emit(out, 51, arc.end_angle.to_degrees());
        }
        Entity::Text(text) => {
            emit(out, 0, "TEXT");
            emit(out, 8, &text.layer);
            emit(out, 10, text.insert.x());
            emit(out, 20, text.insert.y());
            emit(out, 40, text.height);
            emit(out, 50, text.rotation.to_degrees());
            // 多行内容按组码 1 逐行写出，与解析端的拼接规则对偶。
            for line in text.content.split('\n') {
                emit(out, 1, line);
            }
        }
        Entity::MText(mtext) => {
            emit(out, 0, "MTEXT");
            emit(out, 8, &mtext.layer);
            emit(out, 10, mtext.insert.x());
            emit(out, 20, mtext.insert.y());
            emit(out, 40, mtext.height);
            if let Some(width) = mtext.width {
                emit(out, 41, width);
            }
            emit(out, 1, encode_mtext_content(&mtext.content));
        }
        Entity::Leader(leader) => {
            emit(out, 0, "LEADER");
            emit(out, 8, &leader.layer);
            emit(out, 6, &leader.linetype);
            for vertex in &leader.vertices {
                emit(out, 10, vertex.x());
                emit(out, 20, vertex.y());
            }
        }
        Entity::Generic(generic) => {
            emit(out, 0, &generic.entity_type);
            emit(out, 8, &generic.layer);
            emit(out, 6, &generic.linetype);
            if let Some(insert) = generic.insert {
                emit(out, 10, insert.x());
                emit(out, 20, insert.y());
            }
        }
    }
}

fn emit(out: &mut String, code: i32, value: impl std::fmt::Display) {
    out.push_str(&format!("{code}\n{value}\n"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_translates_paragraph_and_space_escapes() {
        assert_eq!(decode_mtext_content("Line1\\PLine2"), "Line1\nLine2");
        assert_eq!(decode_mtext_content("A\\~B"), "A B");
        assert_eq!(decode_mtext_content("C\\\\D"), "C\\D");
        assert_eq!(decode_mtext_content("保留\\X未知转义"), "保留\\X未知转义");
    }

    #[test]
    fn encode_is_inverse_of_decode_for_supported_escapes() {
        let original = "第一行\n第二行\\带反斜杠";
        assert_eq!(decode_mtext_content(&encode_mtext_content(original)), original);
    }

    #[test]
    fn parser_rejects_truncated_pair() {
        let parser = DxfParser::new("0\nSECTION\n2\nENTITIES\n0");
        assert!(parser.parse().is_err());
    }

    #[test]
    fn parser_accepts_empty_source() {
        let parser = DxfParser::new("");
        let doc = parser.parse().expect("空输入应产生空文档");
        assert_eq!(doc.entity_count(), 0);
    }
}
