use std::f64::consts::FRAC_PI_2;
use std::path::PathBuf;

use dxfdiff_core::document::{DEFAULT_LINETYPE, Entity};
use dxfdiff_io::{DocumentLoader, DxfFacade};
use glam::DVec2;

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

#[test]
fn load_basic_entities() {
    let loader = DxfFacade::new();
    let doc = loader
        .load(&fixture("basic_entities.dxf"))
        .expect("读取 DXF 失败");

    assert_eq!(doc.entity_count(), 7);

    let entities: Vec<_> = doc.entities().map(|(_, entity)| entity).collect();

    match entities[0] {
        Entity::Line(line) => {
            assert_eq!(line.layer, "GEOM");
            assert_eq!(line.linetype, "DASHED");
            assert_eq!(line.end.as_vec2(), DVec2::new(10.0, 5.0));
        }
        other => panic!("期望 LINE，实际为 {other:?}"),
    }

    match entities[1] {
        Entity::Circle(circle) => {
            assert_eq!(circle.linetype, DEFAULT_LINETYPE);
            assert!((circle.radius - 2.5).abs() < 1e-9);
        }
        other => panic!("期望 CIRCLE，实际为 {other:?}"),
    }

    match entities[2] {
        Entity::Arc(arc) => {
            assert!(arc.start_angle.abs() < 1e-9);
            assert!((arc.end_angle - FRAC_PI_2).abs() < 1e-9);
        }
        other => panic!("期望 ARC，实际为 {other:?}"),
    }

    match entities[3] {
        Entity::Text(text) => {
            assert_eq!(text.content, "R12");
            assert_eq!(text.layer, "ANNOT");
            assert!((text.height - 2.5).abs() < 1e-9);
        }
        other => panic!("期望 TEXT，实际为 {other:?}"),
    }

    match entities[4] {
        Entity::MText(mtext) => {
            assert_eq!(mtext.content, "Line1\nLine2");
            assert!(mtext.width.is_none());
        }
        other => panic!("期望 MTEXT，实际为 {other:?}"),
    }

    match entities[5] {
        Entity::Leader(leader) => {
            assert_eq!(leader.layer, "NOTE");
            assert_eq!(leader.vertices.len(), 2);
            let (start, end) = leader.anchor_segment().expect("引线缺少锚点对");
            assert!(start.x().abs() < 1e-9);
            assert!((end.y() - 4.0).abs() < 1e-9);
        }
        other => panic!("期望 LEADER，实际为 {other:?}"),
    }

    match entities[6] {
        Entity::Generic(generic) => {
            assert_eq!(generic.entity_type, "HATCH");
            assert_eq!(generic.layer, "FILL");
            let insert = generic.insert.expect("HATCH 应捕获首个坐标对");
            assert!((insert.x() - 7.0).abs() < 1e-9);
            assert!((insert.y() - 8.0).abs() < 1e-9);
        }
        other => panic!("期望 Generic，实际为 {other:?}"),
    }
}

#[test]
fn loader_reports_missing_file() {
    let loader = DxfFacade::new();
    let err = loader
        .load(&fixture("does_not_exist.dxf"))
        .expect_err("不存在的文件应报错");
    assert!(matches!(err, dxfdiff_io::IoError::ReadError { .. }));
}
