use dxfdiff_core::document::Entity;

use crate::tolerance::Tolerance;

/// 组合相对/绝对公差的数值比较：
/// `|a - b| <= max(ε, ε * max(|a|, |b|))`。
/// 逐分量使用，绝不基于欧氏距离，以与键派生处的字段级语义一致。
#[inline]
pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps.max(eps * a.abs().max(b.abs()))
}

/// 判定两个同键实体是否应视为 MODIFIED。对称：
/// `is_modified(a, b, ε) == is_modified(b, a, ε)`。
///
/// 数值比较使用未量化的原始值（而非键中的桶值），因此键命中后
/// 仍可能在量化边界附近判为已修改。类型标签不同时一律视为已修改
/// （同键下不应发生，防御性处理）。
pub fn is_modified(a: &Entity, b: &Entity, tolerance: Tolerance) -> bool {
    let eps = tolerance.get();
    match (a, b) {
        (Entity::Line(lhs), Entity::Line(rhs)) => {
            !approx_eq(lhs.start.x(), rhs.start.x(), eps)
                || !approx_eq(lhs.start.y(), rhs.start.y(), eps)
                || !approx_eq(lhs.end.x(), rhs.end.x(), eps)
                || !approx_eq(lhs.end.y(), rhs.end.y(), eps)
                || lhs.layer != rhs.layer
                || lhs.linetype != rhs.linetype
        }
        (Entity::Text(lhs), Entity::Text(rhs)) => {
            lhs.content != rhs.content
                || !approx_eq(lhs.insert.x(), rhs.insert.x(), eps)
                || !approx_eq(lhs.insert.y(), rhs.insert.y(), eps)
        }
        (Entity::MText(lhs), Entity::MText(rhs)) => {
            lhs.content != rhs.content
                || !approx_eq(lhs.insert.x(), rhs.insert.x(), eps)
                || !approx_eq(lhs.insert.y(), rhs.insert.y(), eps)
        }
        (Entity::Leader(lhs), Entity::Leader(rhs)) => {
            lhs.layer != rhs.layer || lhs.linetype != rhs.linetype
        }
        (Entity::Circle(lhs), Entity::Circle(rhs)) => {
            // 几何已折叠进键，这里只校验样式属性。
            lhs.layer != rhs.layer || lhs.linetype != rhs.linetype
        }
        (Entity::Arc(lhs), Entity::Arc(rhs)) => {
            lhs.layer != rhs.layer || lhs.linetype != rhs.linetype
        }
        (Entity::Generic(lhs), Entity::Generic(rhs)) => {
            lhs.layer != rhs.layer || lhs.linetype != rhs.linetype
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxfdiff_core::document::{Circle, DEFAULT_LINETYPE, Entity, Line, Text};
    use dxfdiff_core::geometry::Point2;

    fn tol(eps: f64) -> Tolerance {
        Tolerance::new(eps).expect("valid tolerance")
    }

    fn line(sx: f64, sy: f64, ex: f64, ey: f64, layer: &str) -> Entity {
        Entity::Line(Line {
            start: Point2::new(sx, sy),
            end: Point2::new(ex, ey),
            layer: layer.to_string(),
            linetype: DEFAULT_LINETYPE.to_string(),
        })
    }

    #[test]
    fn approx_eq_uses_combined_relative_absolute_test() {
        let eps = 1e-6;
        assert!(approx_eq(10.0, 10.0 + 5e-7, eps));
        assert!(!approx_eq(10.0, 10.0 + 2e-5, eps));
        // 大数值时相对项起作用：1e6 * 1e-6 = 1 的余量。
        assert!(approx_eq(1_000_000.0, 1_000_000.5, eps));
        assert!(!approx_eq(1_000_000.0, 1_000_002.0, eps));
    }

    #[test]
    fn line_within_tolerance_is_unchanged() {
        let a = line(0.0, 0.0, 10.0, 0.0, "L1");
        let b = line(0.0, 0.0, 10.0 + 5e-7, 0.0, "L1");
        assert!(!is_modified(&a, &b, tol(1e-6)));
    }

    #[test]
    fn line_layer_change_is_modified() {
        let a = line(0.0, 0.0, 10.0, 0.0, "L1");
        let b = line(0.0, 0.0, 10.0, 0.0, "L2");
        assert!(is_modified(&a, &b, tol(1e-6)));
    }

    #[test]
    fn circle_compares_style_only() {
        let a = Entity::Circle(Circle {
            center: Point2::new(0.0, 0.0),
            radius: 5.0,
            layer: "GEOM".to_string(),
            linetype: DEFAULT_LINETYPE.to_string(),
        });
        let b = Entity::Circle(Circle {
            center: Point2::new(0.0, 0.0),
            radius: 5.0,
            layer: "GEOM".to_string(),
            linetype: "DASHED".to_string(),
        });
        assert!(is_modified(&a, &b, tol(1e-6)));
    }

    #[test]
    fn mismatched_kinds_are_always_modified() {
        let a = line(0.0, 0.0, 1.0, 0.0, "L1");
        let b = Entity::Text(Text {
            insert: Point2::new(0.0, 0.0),
            content: "X".to_string(),
            height: 1.0,
            rotation: 0.0,
            layer: "L1".to_string(),
        });
        assert!(is_modified(&a, &b, tol(1e-6)));
    }

    #[test]
    fn comparator_is_symmetric() {
        let a = line(0.0, 0.0, 10.0, 0.0, "L1");
        let b = line(0.0, 0.0, 10.0 + 3e-6, 0.0, "L1");
        let t = tol(1e-6);
        assert_eq!(is_modified(&a, &b, t), is_modified(&b, &a, t));
    }
}
