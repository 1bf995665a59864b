//! Property tests for history, gestures and snapping.

use kurbo::{Point, Rect, Vec2};
use moonlight_core::handles::{MIN_SIZE, resize_box};
use moonlight_core::shapes::{Circle, Ellipse, Line, Rectangle};
use moonlight_core::{
    AnchorName, Camera, Command, Connection, Corner, Editor, Element, ElementId, Grid, History,
    PointerInput, Scene, Shape, StylePatch, ZOrder,
};
use proptest::prelude::*;

type ShapeSpec = (u8, i32, i32, i32, i32);

fn build_scene(specs: &[ShapeSpec]) -> Scene {
    let mut scene = Scene::new();
    for &(kind, x, y, w, h) in specs {
        let (x, y) = (x as f64, y as f64);
        let shape = match kind {
            0 => Shape::Rectangle(Rectangle::new(Point::new(x, y), w as f64, h as f64)),
            1 => Shape::Circle(Circle::new(Point::new(x, y), (w / 2).max(1) as f64)),
            _ => Shape::Ellipse(Ellipse::new(
                Point::new(x, y),
                (w / 2).max(1) as f64,
                (h / 2).max(1) as f64,
            )),
        };
        let id = scene.next_id();
        scene.insert(Element::new(id, shape));
    }
    if scene.len() >= 2 {
        let mut line = Line::new(Point::ZERO, Point::ZERO);
        line.start_connection = Some(Connection::new("el-1".into(), AnchorName::Right));
        line.end_connection = Some(Connection::new("el-2".into(), AnchorName::Left));
        let id = scene.next_id();
        scene.insert(Element::new(id, Shape::Line(line)));
        scene.resolve_connections();
    }
    scene
}

fn scene_strategy() -> impl Strategy<Value = Scene> {
    prop::collection::vec(
        (0u8..3, -200i32..200, -200i32..200, 2i32..150, 2i32..150),
        1..6,
    )
    .prop_map(|specs| build_scene(&specs))
}

fn command_strategy(ids: Vec<ElementId>) -> BoxedStrategy<Command> {
    let count = ids.len();
    let subset = prop::sample::subsequence(ids.clone(), 1..=count);
    let single = prop::sample::select(ids);
    let delta = (-100i32..100, -100i32..100).prop_map(|(x, y)| Vec2::new(x as f64, y as f64));

    prop_oneof![
        (subset.clone(), delta.clone()).prop_map(|(ids, delta)| Command::Move { ids, delta }),
        subset.clone().prop_map(|ids| Command::Delete { ids }),
        (single, -50i32..50, -50i32..50, 2i32..200, 2i32..200).prop_map(
            |(id, x, y, w, h)| {
                let (x, y) = (x as f64, y as f64);
                Command::Resize {
                    id,
                    corner: Corner::SouthEast,
                    bounds: Rect::new(x, y, x + w as f64, y + h as f64),
                }
            }
        ),
        (subset.clone(), prop_oneof![Just("#ff0000"), Just("blue")]).prop_map(|(ids, fill)| {
            Command::Restyle {
                ids,
                patch: StylePatch {
                    fill: Some(fill.to_string()),
                    ..StylePatch::default()
                },
            }
        }),
        (subset.clone(), delta).prop_map(|(ids, offset)| Command::Duplicate { ids, offset }),
        (subset.clone(), any::<bool>()).prop_map(|(ids, front)| Command::Reorder {
            ids,
            to: if front { ZOrder::Front } else { ZOrder::Back },
        }),
        subset.prop_map(|ids| Command::Group { ids }),
        Just(Command::Clear),
    ]
    .boxed()
}

fn scene_and_command() -> impl Strategy<Value = (Scene, Command)> {
    scene_strategy().prop_flat_map(|scene| {
        let ids = scene.ids();
        (Just(scene), command_strategy(ids))
    })
}

fn editor_with(shape: Shape) -> (Editor, ElementId) {
    let mut editor = Editor::new(Camera::default(), Grid::default(), 100);
    let id = editor.scene.next_id();
    editor.scene.insert(Element::new(id.clone(), shape));
    (editor, id)
}

proptest! {
    #[test]
    fn undo_restores_and_redo_reapplies((scene, command) in scene_and_command()) {
        let original = scene.clone();
        let mut scene = scene;
        let mut history = History::new(100);

        match history.execute(&mut scene, command) {
            Ok(Some(_)) => {
                let after = scene.clone();
                prop_assert_eq!(history.undo_len(), 1);
                prop_assert!(history.undo(&mut scene).is_some());
                prop_assert_eq!(&scene, &original);
                prop_assert!(history.redo(&mut scene).is_some());
                prop_assert_eq!(&scene, &after);
            }
            Ok(None) | Err(_) => {
                prop_assert_eq!(&scene, &original);
                prop_assert!(!history.can_undo());
            }
        }
    }

    #[test]
    fn drag_moves_by_exact_delta(dx in -200i32..200, dy in -200i32..200) {
        prop_assume!(dx != 0 || dy != 0);
        let (mut editor, id) = editor_with(Shape::Rectangle(Rectangle::new(
            Point::new(0.0, 0.0),
            100.0,
            100.0,
        )));
        let (dx, dy) = (dx as f64, dy as f64);

        editor.pointer_down(&PointerInput::at(50.0, 50.0));
        editor.pointer_move(&PointerInput::at(50.0 + dx / 2.0, 50.0 + dy / 2.0));
        editor.pointer_move(&PointerInput::at(50.0 + dx, 50.0 + dy));
        editor.pointer_up(&PointerInput::at(50.0 + dx, 50.0 + dy));

        let bounds = editor.scene.bounds_of(&id).unwrap();
        prop_assert_eq!(bounds.origin(), Point::new(dx, dy));
        prop_assert_eq!(editor.history.undo_len(), 1);

        prop_assert!(editor.undo());
        prop_assert_eq!(editor.scene.bounds_of(&id).unwrap().origin(), Point::ZERO);
    }

    #[test]
    fn se_resize_lands_on_grid(
        x in -200i32..200,
        y in -200i32..200,
        w in 2i32..200,
        h in 2i32..200,
        px in -400.0f64..400.0,
        py in -400.0f64..400.0,
        kind in 0u8..3,
        size in prop_oneof![Just(10.0), Just(20.0), Just(25.0)],
    ) {
        let mut scene = Scene::new();
        let id = scene.next_id();
        let rect = Rect::new(x as f64, y as f64, (x + w) as f64, (y + h) as f64);
        let shape = match kind {
            0 => Shape::Rectangle(Rectangle::from_rect(rect)),
            1 => Shape::Ellipse(Ellipse::from_rect(rect)),
            _ => Shape::Circle(Circle::new(rect.center(), (w / 2).max(1) as f64)),
        };
        scene.insert(Element::new(id.clone(), shape));

        let original = scene.bounds_of(&id).unwrap();
        let target = resize_box(original, Corner::SouthEast, Point::new(px, py), Grid::new(true, size));
        scene.resize(&id, Corner::SouthEast, target).unwrap();

        let bounds = scene.bounds_of(&id).unwrap();
        prop_assert_eq!(bounds.x1.rem_euclid(size), 0.0);
        prop_assert_eq!(bounds.y1.rem_euclid(size), 0.0);
        prop_assert!(bounds.width() >= MIN_SIZE);
        prop_assert!(bounds.height() >= MIN_SIZE);
        if kind == 0 {
            prop_assert_eq!(bounds.origin(), original.origin());
        }
    }

    #[test]
    fn connect_drag_respects_threshold(
        distance in 0.0f64..40.0,
        angle in 0.0f64..std::f64::consts::TAU,
        offset in 0.0f64..7.0,
    ) {
        prop_assume!((distance - 10.0).abs() > 1e-6);
        let (mut editor, id) = editor_with(Shape::Rectangle(Rectangle::new(
            Point::new(0.0, 0.0),
            100.0,
            100.0,
        )));
        editor.selection.select_one(id);

        // Anywhere within the anchor's hit tolerance
        let press = Point::new(100.0 + offset, 50.0);
        let drop = press + Vec2::new(angle.cos(), angle.sin()) * distance;
        editor.pointer_down(&PointerInput::at(press.x, press.y));
        editor.pointer_move(&PointerInput::at(drop.x, drop.y));
        editor.pointer_up(&PointerInput::at(drop.x, drop.y));

        let expected = if distance < 10.0 { 1 } else { 2 };
        prop_assert_eq!(editor.scene.len(), expected);
        prop_assert_eq!(editor.history.undo_len(), expected - 1);
    }
}
