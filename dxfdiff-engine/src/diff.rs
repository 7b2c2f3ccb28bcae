use std::collections::HashMap;

use tracing::debug;

use dxfdiff_core::document::{DEFAULT_LINETYPE, Document, Entity};
use dxfdiff_core::geometry::Point2;

use crate::compare::is_modified;
use crate::key::entity_key;
use crate::tolerance::Tolerance;

/// 无法忠实重建的实体退化为文本标记时使用的字高。
const FALLBACK_MARKER_HEIGHT: f64 = 2.5;

/// 每个实体的四态分类结果，仅在一次差分运行内存在，
/// 最终只以输出文档的图层归属形式落地。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Added,
    Removed,
    Modified,
    Unchanged,
}

impl Classification {
    /// 输出文档中对应的注记图层名。
    #[inline]
    pub fn layer_name(self) -> &'static str {
        match self {
            Classification::Added => "ADDED",
            Classification::Removed => "REMOVED",
            Classification::Modified => "MODIFIED",
            Classification::Unchanged => "UNCHANGED",
        }
    }

    /// 注记图层的 ACI 颜色码：绿 / 红 / 蓝 / 白。
    #[inline]
    pub fn color(self) -> i16 {
        match self {
            Classification::Added => 3,
            Classification::Removed => 1,
            Classification::Modified => 5,
            Classification::Unchanged => 7,
        }
    }

    pub const ALL: [Classification; 4] = [
        Classification::Added,
        Classification::Removed,
        Classification::Modified,
        Classification::Unchanged,
    ];
}

/// 四类分类的计数汇总。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
}

impl DiffSummary {
    fn record(&mut self, classification: Classification) {
        match classification {
            Classification::Added => self.added += 1,
            Classification::Removed => self.removed += 1,
            Classification::Modified => self.modified += 1,
            Classification::Unchanged => self.unchanged += 1,
        }
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.added + self.removed + self.modified + self.unchanged
    }
}

/// 一次差分运行的产物：重建后的结果文档与计数汇总。
#[derive(Debug)]
pub struct DiffResult {
    pub document: Document,
    pub summary: DiffSummary,
}

/// 按插入顺序维护 键 -> 实体 的查找表。
/// 同一文档内键冲突时采取"后写覆盖"：值被替换，位置保留首次插入处。
/// 这是文档化的策略而非缺陷，见键派生处的约定。
struct KeyedEntities<'a> {
    order: Vec<String>,
    map: HashMap<String, &'a Entity>,
}

impl<'a> KeyedEntities<'a> {
    fn from_document(document: &'a Document, tolerance: Tolerance) -> Self {
        let mut keyed = Self {
            order: Vec::new(),
            map: HashMap::new(),
        };
        for (_, entity) in document.entities() {
            let key = entity_key(entity, tolerance);
            if keyed.map.insert(key.clone(), entity).is_none() {
                keyed.order.push(key);
            }
        }
        keyed
    }

    #[inline]
    fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    #[inline]
    fn get(&self, key: &str) -> Option<&'a Entity> {
        self.map.get(key).copied()
    }

    #[inline]
    fn len(&self) -> usize {
        self.order.len()
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &'a Entity)> {
        self.order
            .iter()
            .map(|key| (key.as_str(), self.map[key]))
    }
}

/// 差分分类器：对两份文档的每个实体各给出一次分类。
///
/// 输出顺序确定：先按基准文档 A 的原始顺序给出 REMOVED 组，
/// 再按候选文档 B 的原始顺序给出 ADDED 与 MODIFIED/UNCHANGED 组；
/// 匹配键对展示候选侧版本，基准侧版本被丢弃。
/// 任一侧为空文档是合法输入，产生全 REMOVED 或全 ADDED 的结果。
pub fn classify<'a>(
    baseline: &'a Document,
    candidate: &'a Document,
    tolerance: Tolerance,
) -> Vec<(&'a Entity, Classification)> {
    let keyed_a = KeyedEntities::from_document(baseline, tolerance);
    let keyed_b = KeyedEntities::from_document(candidate, tolerance);

    let mut classified = Vec::with_capacity(keyed_a.len() + keyed_b.len());

    for (key, entity) in keyed_a.iter() {
        if !keyed_b.contains(key) {
            classified.push((entity, Classification::Removed));
        }
    }

    for (key, entity) in keyed_b.iter() {
        match keyed_a.get(key) {
            None => classified.push((entity, Classification::Added)),
            Some(entity_a) => {
                let classification = if is_modified(entity_a, entity, tolerance) {
                    Classification::Modified
                } else {
                    Classification::Unchanged
                };
                classified.push((entity, classification));
            }
        }
    }

    classified
}

/// 输出合成器：为每个已分类实体重建一份尽力而为的副本，
/// 放到以分类命名的注记图层上。唯一允许新建图层与实体的组件，
/// 绝不改动输入文档中的实体。
pub fn synthesize(classified: &[(&Entity, Classification)]) -> Document {
    let mut result = Document::new();
    for classification in Classification::ALL {
        result.ensure_layer_with_color(classification.layer_name(), classification.color());
    }
    for (entity, classification) in classified {
        rebuild_entity(&mut result, entity, *classification);
    }
    result
}

/// 差分引擎入口：单线程、同步、无跨运行共享状态。
pub fn diff_documents(
    baseline: &Document,
    candidate: &Document,
    tolerance: Tolerance,
) -> DiffResult {
    let classified = classify(baseline, candidate, tolerance);

    let mut summary = DiffSummary::default();
    for (_, classification) in &classified {
        summary.record(*classification);
    }
    debug!(
        added = summary.added,
        removed = summary.removed,
        modified = summary.modified,
        unchanged = summary.unchanged,
        tolerance = tolerance.get(),
        "图形差分完成"
    );

    let document = synthesize(&classified);
    DiffResult { document, summary }
}

fn rebuild_entity(result: &mut Document, entity: &Entity, classification: Classification) {
    let layer = classification.layer_name();
    match entity {
        Entity::Line(line) => {
            result.add_line(line.start, line.end, layer, DEFAULT_LINETYPE);
        }
        Entity::Circle(circle) => {
            result.add_circle(circle.center, circle.radius, layer, DEFAULT_LINETYPE);
        }
        Entity::Arc(arc) => {
            result.add_arc(
                arc.center,
                arc.radius,
                arc.start_angle,
                arc.end_angle,
                layer,
                DEFAULT_LINETYPE,
            );
        }
        Entity::Text(text) => {
            result.add_text(
                text.insert,
                text.content.clone(),
                text.height,
                text.rotation,
                layer,
            );
        }
        Entity::MText(mtext) => {
            result.add_mtext(
                mtext.insert,
                mtext.content.clone(),
                mtext.height,
                mtext.width,
                layer,
            );
        }
        Entity::Leader(leader) => match leader.anchor_segment() {
            Some((start, end)) => {
                result.add_line(start, end, layer, DEFAULT_LINETYPE);
            }
            None => {
                place_marker(result, "LEADER", leader.vertices.first().copied(), layer);
            }
        },
        Entity::Generic(generic) => {
            place_marker(result, &generic.entity_type, generic.insert, layer);
        }
    }
}

/// 放置 `[<类型标签>]` 文本标记：有插入点用插入点，否则退到原点。
fn place_marker(result: &mut Document, type_tag: &str, insert: Option<Point2>, layer: &str) {
    result.add_text(
        insert.unwrap_or_else(|| Point2::new(0.0, 0.0)),
        format!("[{type_tag}]"),
        FALLBACK_MARKER_HEIGHT,
        0.0,
        layer,
    );
}
