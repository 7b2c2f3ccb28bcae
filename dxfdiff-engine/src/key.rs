use dxfdiff_core::document::Entity;

use crate::tolerance::Tolerance;

/// 把数值按 ε 量化到最近的桶：`round(value / ε) * ε`。
/// 已知边界现象：两个相差略小于 ε 的值仍可能落在相邻桶中，
/// 这是键匹配策略固有的近似，不做特殊处理。
fn quantize(value: f64, eps: f64) -> f64 {
    // `+ 0.0` 把 -0.0 归一为 0.0，避免同一桶因符号位产生两种文本表示。
    (value / eps).round() * eps + 0.0
}

/// 为实体派生跨文档匹配用的规范化键。
/// 纯函数：仅依赖实体属性与 ε，对坐标量化、对文本取原始内容。
///
/// 各种类的键构成是固定约定：
/// - Line: 量化起终点 + 图层 + 线型
/// - Circle: 量化圆心 + 半径
/// - Arc: 量化圆心 + 半径 + 起止角
/// - Text / MText: 量化插入点 + 原始文本（文本不参与公差）
/// - Leader: 仅图层 + 线型（几何有意排除在键之外）
/// - Generic: 类型标签 + 图层 + 线型
pub fn entity_key(entity: &Entity, tolerance: Tolerance) -> String {
    let eps = tolerance.get();
    match entity {
        Entity::Line(line) => format!(
            "LINE_{}_{}_{}_{}_{}_{}",
            quantize(line.start.x(), eps),
            quantize(line.start.y(), eps),
            quantize(line.end.x(), eps),
            quantize(line.end.y(), eps),
            line.layer,
            line.linetype
        ),
        Entity::Circle(circle) => format!(
            "CIRCLE_{}_{}_{}",
            quantize(circle.center.x(), eps),
            quantize(circle.center.y(), eps),
            quantize(circle.radius, eps)
        ),
        Entity::Arc(arc) => format!(
            "ARC_{}_{}_{}_{}_{}",
            quantize(arc.center.x(), eps),
            quantize(arc.center.y(), eps),
            quantize(arc.radius, eps),
            quantize(arc.start_angle, eps),
            quantize(arc.end_angle, eps)
        ),
        Entity::Text(text) => format!(
            "TEXT_{}_{}_{}",
            quantize(text.insert.x(), eps),
            quantize(text.insert.y(), eps),
            text.content
        ),
        Entity::MText(mtext) => format!(
            "MTEXT_{}_{}_{}",
            quantize(mtext.insert.x(), eps),
            quantize(mtext.insert.y(), eps),
            mtext.content
        ),
        Entity::Leader(leader) => format!("LEADER_{}_{}", leader.layer, leader.linetype),
        Entity::Generic(generic) => format!(
            "{}_{}_{}",
            generic.entity_type, generic.layer, generic.linetype
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxfdiff_core::document::{DEFAULT_LINETYPE, Entity, Line, Text};
    use dxfdiff_core::geometry::Point2;

    fn tol(eps: f64) -> Tolerance {
        Tolerance::new(eps).expect("valid tolerance")
    }

    fn line(sx: f64, sy: f64, ex: f64, ey: f64) -> Entity {
        Entity::Line(Line {
            start: Point2::new(sx, sy),
            end: Point2::new(ex, ey),
            layer: "L1".to_string(),
            linetype: DEFAULT_LINETYPE.to_string(),
        })
    }

    #[test]
    fn nearby_coordinates_share_a_bucket() {
        let a = entity_key(&line(0.0, 0.0, 10.0, 0.0), tol(1e-6));
        let b = entity_key(&line(0.0, 0.0, 10.0 + 4e-7, 0.0), tol(1e-6));
        assert_eq!(a, b);
    }

    #[test]
    fn coordinates_beyond_tolerance_split_buckets() {
        let a = entity_key(&line(0.0, 0.0, 10.0, 0.0), tol(1e-6));
        let b = entity_key(&line(0.0, 0.0, 10.0 + 2e-6, 0.0), tol(1e-6));
        assert_ne!(a, b);
    }

    #[test]
    fn bucket_boundary_can_split_values_closer_than_tolerance() {
        // 量化匹配的已知边界现象：相差 0.8ε 的两值跨过桶边界时不再同键。
        let a = entity_key(&line(0.0, 0.0, 10.0 + 0.4e-6, 0.0), tol(1e-6));
        let b = entity_key(&line(0.0, 0.0, 10.0 + 1.2e-6, 0.0), tol(1e-6));
        assert_ne!(a, b);
    }

    #[test]
    fn negative_zero_folds_into_positive_bucket() {
        let a = entity_key(&line(-1e-9, 0.0, 10.0, 0.0), tol(1e-6));
        let b = entity_key(&line(1e-9, 0.0, 10.0, 0.0), tol(1e-6));
        assert_eq!(a, b);
    }

    #[test]
    fn text_content_participates_in_key_without_tolerance() {
        let a = Entity::Text(Text {
            insert: Point2::new(1.0, 1.0),
            content: "R1".to_string(),
            height: 2.5,
            rotation: 0.0,
            layer: "ANNOT".to_string(),
        });
        let b = Entity::Text(Text {
            insert: Point2::new(1.0, 1.0),
            content: "R2".to_string(),
            height: 2.5,
            rotation: 0.0,
            layer: "ANNOT".to_string(),
        });
        assert_ne!(entity_key(&a, tol(1e-6)), entity_key(&b, tol(1e-6)));
    }

    #[test]
    fn leader_key_ignores_geometry() {
        use dxfdiff_core::document::Leader;
        let a = Entity::Leader(Leader {
            layer: "NOTE".to_string(),
            linetype: DEFAULT_LINETYPE.to_string(),
            vertices: vec![Point2::new(0.0, 0.0), Point2::new(5.0, 5.0)],
        });
        let b = Entity::Leader(Leader {
            layer: "NOTE".to_string(),
            linetype: DEFAULT_LINETYPE.to_string(),
            vertices: vec![Point2::new(100.0, 100.0)],
        });
        assert_eq!(entity_key(&a, tol(1e-6)), entity_key(&b, tol(1e-6)));
    }
}
