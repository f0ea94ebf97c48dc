/// Canva Mix board: decor objects placed on a background
///
/// Objects and their transforms are kept in two index-aligned vectors.
/// Every mutation goes through `CanvaBoard` so both always have the same
/// length; removing an object removes its transform and clears the selection.

use cgmath::{Basis2, Deg, Rotation, Rotation2, Vector2};
use serde::{Deserialize, Serialize};

use super::data::SourceImage;

/// Smallest and largest object width, in percent of the canvas width
const MIN_SCALE: f32 = 5.0;
const MAX_SCALE: f32 = 100.0;
const DEFAULT_SCALE: f32 = 25.0;

/// Pose of a placed object on the background
///
/// `x`/`y` locate the object centre in percent of the canvas size,
/// `scale` is the object width in percent of the canvas width and
/// `rotation` is clockwise in degrees.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransform {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub rotation: f32,
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            x: 50.0,
            y: 50.0,
            scale: DEFAULT_SCALE,
            rotation: 0.0,
        }
    }
}

/// One object as sent to the furniture placement operation
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Placement {
    pub image: SourceImage,
    pub transform: ObjectTransform,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvaBoard {
    objects: Vec<SourceImage>,
    transforms: Vec<ObjectTransform>,
    selected: Option<usize>,
    locked: bool,
}

impl CanvaBoard {
    pub fn objects(&self) -> &[SourceImage] {
        &self.objects
    }

    pub fn transforms(&self) -> &[ObjectTransform] {
        &self.transforms
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Place a new object at the centre and select it
    pub fn add_object(&mut self, image: SourceImage) -> usize {
        self.objects.push(image);
        self.transforms.push(ObjectTransform::default());
        let index = self.objects.len() - 1;
        self.selected = Some(index);
        index
    }

    /// Remove the object at `index` together with its transform
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.objects.len() {
            return false;
        }
        self.objects.remove(index);
        self.transforms.remove(index);
        self.selected = None;
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selected {
            Some(index) => self.remove(index),
            None => false,
        }
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|i| *i < self.objects.len());
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.transforms.clear();
        self.selected = None;
    }

    fn selected_transform_mut(&mut self) -> Option<&mut ObjectTransform> {
        if self.locked {
            return None;
        }
        let index = self.selected?;
        self.transforms.get_mut(index)
    }

    /// Move the selected object by a delta in canvas percent
    pub fn move_selected(&mut self, dx: f32, dy: f32) {
        if let Some(transform) = self.selected_transform_mut() {
            transform.x = (transform.x + dx).clamp(0.0, 100.0);
            transform.y = (transform.y + dy).clamp(0.0, 100.0);
        }
    }

    pub fn scale_selected(&mut self, factor: f32) {
        if let Some(transform) = self.selected_transform_mut() {
            transform.scale = (transform.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        }
    }

    pub fn rotate_selected(&mut self, degrees: f32) {
        if let Some(transform) = self.selected_transform_mut() {
            transform.rotation = (transform.rotation + degrees).rem_euclid(360.0);
        }
    }

    /// Pair every object with its transform for the placement request
    pub fn placements(&self) -> Vec<Placement> {
        self.objects
            .iter()
            .zip(&self.transforms)
            .map(|(image, transform)| Placement {
                image: image.clone(),
                transform: *transform,
            })
            .collect()
    }

    /// Find the topmost object under a point given in canvas pixels
    ///
    /// Objects are treated as squares of their scaled width, rotated
    /// around their centre.
    pub fn hit_test(&self, x: f32, y: f32, width: f32, height: f32) -> Option<usize> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        self.transforms
            .iter()
            .enumerate()
            .rev()
            .find(|(_, t)| {
                let half = t.scale / 100.0 * width / 2.0;
                let offset = Vector2::new(x - t.x / 100.0 * width, y - t.y / 100.0 * height);
                let rotation: Basis2<f32> = Rotation2::from_angle(Deg(-t.rotation));
                let local = rotation.rotate_vector(offset);
                local.x.abs() <= half && local.y.abs() <= half
            })
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decor(tag: &str) -> SourceImage {
        SourceImage::new(tag, "image/png")
    }

    #[test]
    fn test_delete_removes_pair_and_clears_selection() {
        let mut board = CanvaBoard::default();
        board.add_object(decor("chair"));
        board.add_object(decor("lamp"));
        board.select(Some(0));
        board.move_selected(10.0, 0.0);

        assert!(board.delete_selected());

        assert_eq!(board.objects(), &[decor("lamp")]);
        assert_eq!(board.transforms()[0], ObjectTransform::default());
        assert_eq!(board.selected(), None);
        assert!(!board.delete_selected());
    }

    #[test]
    fn test_locked_board_ignores_moves() {
        let mut board = CanvaBoard::default();
        board.add_object(decor("sofa"));
        board.set_locked(true);
        board.move_selected(20.0, 20.0);
        board.scale_selected(2.0);
        assert_eq!(board.transforms()[0], ObjectTransform::default());
    }

    #[test]
    fn test_transform_clamping() {
        let mut board = CanvaBoard::default();
        board.add_object(decor("plant"));
        board.move_selected(80.0, -80.0);
        board.scale_selected(100.0);
        board.rotate_selected(-90.0);

        let t = board.transforms()[0];
        assert_eq!((t.x, t.y), (100.0, 0.0));
        assert_eq!(t.scale, MAX_SCALE);
        assert_eq!(t.rotation, 270.0);
    }

    #[test]
    fn test_hit_test_prefers_topmost_and_honours_rotation() {
        let mut board = CanvaBoard::default();
        board.add_object(decor("rug"));
        board.add_object(decor("table"));

        // Both sit at the centre of a 400x400 canvas, the later one wins
        assert_eq!(board.hit_test(200.0, 200.0, 400.0, 400.0), Some(1));

        // A 100px square rotated 45 degrees no longer covers its old corner
        board.remove(0);
        board.select(Some(0));
        board.rotate_selected(45.0);
        assert_eq!(board.hit_test(248.0, 248.0, 400.0, 400.0), None);
        assert_eq!(board.hit_test(200.0, 265.0, 400.0, 400.0), Some(0));
        assert_eq!(board.hit_test(10.0, 10.0, 400.0, 400.0), None);
    }

    #[test]
    fn test_placements_pair_by_index() {
        let mut board = CanvaBoard::default();
        board.add_object(decor("a"));
        board.add_object(decor("b"));
        board.move_selected(5.0, 5.0);

        let placements = board.placements();
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[1].image, decor("b"));
        assert_eq!(placements[1].transform.x, 55.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum BoardOp {
        Add,
        Select(Option<usize>),
        Remove(usize),
        DeleteSelected,
        Move(f32, f32),
        Scale(f32),
        Rotate(f32),
        Lock(bool),
        Clear,
    }

    fn arb_op() -> impl Strategy<Value = BoardOp> {
        prop_oneof![
            3 => Just(BoardOp::Add),
            2 => proptest::option::of(0usize..8).prop_map(BoardOp::Select),
            1 => (0usize..8).prop_map(BoardOp::Remove),
            2 => Just(BoardOp::DeleteSelected),
            2 => (-150.0f32..150.0, -150.0f32..150.0).prop_map(|(dx, dy)| BoardOp::Move(dx, dy)),
            1 => (0.0f32..10.0).prop_map(BoardOp::Scale),
            1 => (-720.0f32..720.0).prop_map(BoardOp::Rotate),
            1 => any::<bool>().prop_map(BoardOp::Lock),
            1 => Just(BoardOp::Clear),
        ]
    }

    fn apply(board: &mut CanvaBoard, step: usize, op: BoardOp) {
        match op {
            BoardOp::Add => {
                board.add_object(SourceImage::new(format!("decor{step}"), "image/png"));
            }
            BoardOp::Select(index) => board.select(index),
            BoardOp::Remove(index) => {
                board.remove(index);
            }
            BoardOp::DeleteSelected => {
                board.delete_selected();
            }
            BoardOp::Move(dx, dy) => board.move_selected(dx, dy),
            BoardOp::Scale(factor) => board.scale_selected(factor),
            BoardOp::Rotate(degrees) => board.rotate_selected(degrees),
            BoardOp::Lock(locked) => board.set_locked(locked),
            BoardOp::Clear => board.clear(),
        }
    }

    proptest! {
        #[test]
        fn objects_and_transforms_stay_aligned(ops in prop::collection::vec(arb_op(), 0..64)) {
            let mut board = CanvaBoard::default();
            for (step, op) in ops.into_iter().enumerate() {
                apply(&mut board, step, op);

                prop_assert_eq!(board.objects().len(), board.transforms().len());
                prop_assert_eq!(board.len(), board.objects().len());
                if let Some(index) = board.selected() {
                    prop_assert!(index < board.len());
                }
                for t in board.transforms() {
                    prop_assert!((0.0..=100.0).contains(&t.x) && (0.0..=100.0).contains(&t.y));
                    prop_assert!((MIN_SCALE..=MAX_SCALE).contains(&t.scale));
                    prop_assert!((0.0..=360.0).contains(&t.rotation));
                }
            }
        }
    }
}
