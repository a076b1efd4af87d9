//=========================================================================
// Interactive Objects
//=========================================================================
//
// Live visuals of the current step, keyed by content object id.
//
// Moving between steps diffs the id sets: removed objects are destroyed
// first, surviving ones are updated in place, new ones are created last.
// A new step therefore never shows its objects next to leftovers of the
// previous one.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::trace;

//=== Internal Dependencies ===============================================

use crate::data::{InteractiveObjectSpec, ObjectRole};
use crate::presentation::{
    AnimatedProperty, Interaction, Point, Presenter, Rect, VisualHandle, VisualKind, VisualProps,
};

//=== PlacedObject ========================================================

#[derive(Debug, Clone)]
pub struct PlacedObject {
    pub spec: InteractiveObjectSpec,
    pub handle: VisualHandle,
    /// Where the object rests; drops that miss return here.
    pub home: Point,
}

impl PlacedObject {
    pub fn bounds_at(&self, center: Point) -> Rect {
        Rect::centered(center, self.spec.size_percent)
    }
}

//=== StepDiff ============================================================

/// Ids touched by one diff, in the order the work happened.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StepDiff {
    pub removed: Vec<String>,
    pub updated: Vec<String>,
    pub created: Vec<String>,
}

//=== ObjectSet ===========================================================

#[derive(Debug, Default)]
pub struct ObjectSet {
    objects: Vec<PlacedObject>,
}

impl ObjectSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PlacedObject> {
        self.objects.iter().find(|o| o.spec.id == id)
    }

    pub fn by_handle(&self, handle: VisualHandle) -> Option<&PlacedObject> {
        self.objects.iter().find(|o| o.handle == handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedObject> {
        self.objects.iter()
    }

    pub fn with_role(&self, role: ObjectRole) -> impl Iterator<Item = &PlacedObject> {
        self.objects.iter().filter(move |o| o.spec.role == role)
    }

    /// First target whose bounds intersect `bounds`.
    pub fn first_target_hit(&self, bounds: &Rect) -> Option<&PlacedObject> {
        self.with_role(ObjectRole::Target)
            .find(|t| t.bounds_at(t.home).intersects(bounds))
    }

    /// Records that an accepted drop left the object at `position`.
    pub fn settle(&mut self, handle: VisualHandle, position: Point) {
        if let Some(object) = self.objects.iter_mut().find(|o| o.handle == handle) {
            object.home = position;
        }
    }

    //--- Step Transitions -------------------------------------------------

    /// Brings the live objects in line with a step's object list.
    pub fn diff(
        &mut self,
        presenter: &mut dyn Presenter,
        specs: &[InteractiveObjectSpec],
        base_depth: i32,
    ) -> StepDiff {
        let mut diff = StepDiff::default();

        // 1. Destroy what the new step no longer has.
        let mut kept = Vec::with_capacity(self.objects.len());
        for object in self.objects.drain(..) {
            if specs.iter().any(|s| s.id == object.spec.id) {
                kept.push(object);
            } else {
                presenter.destroy_visual(object.handle);
                diff.removed.push(object.spec.id);
            }
        }

        // 2. Update survivors, 3. create newcomers, both in step order.
        let mut next = Vec::with_capacity(specs.len());
        for spec in specs {
            match kept.iter().position(|o| o.spec.id == spec.id) {
                Some(index) => {
                    let mut object = kept.swap_remove(index);
                    if object.spec != *spec {
                        update(presenter, &mut object, spec, base_depth);
                        diff.updated.push(spec.id.clone());
                    }
                    next.push(object);
                }
                None => {
                    next.push(create(presenter, spec, base_depth));
                    diff.created.push(spec.id.clone());
                }
            }
        }

        trace!("Object diff: {:?}", diff);
        self.objects = next;
        diff
    }

    /// Turns drag (or tap) listening on or off for the given objects.
    pub fn listen(
        &self,
        presenter: &mut dyn Presenter,
        interaction: Interaction,
        enabled: bool,
        mut which: impl FnMut(&PlacedObject) -> bool,
    ) {
        for object in self.objects.iter().filter(|o| which(o)) {
            presenter.listen(object.handle, interaction, enabled);
        }
    }

    /// Destroys every object.
    pub fn clear(&mut self, presenter: &mut dyn Presenter) {
        for object in self.objects.drain(..) {
            presenter.destroy_visual(object.handle);
        }
    }
}

fn props(spec: &InteractiveObjectSpec, base_depth: i32) -> VisualProps {
    VisualProps {
        size_percent: spec.size_percent,
        depth: base_depth + spec.depth,
        alpha: 1.0,
    }
}

fn create(
    presenter: &mut dyn Presenter,
    spec: &InteractiveObjectSpec,
    base_depth: i32,
) -> PlacedObject {
    let handle = presenter.create_visual(
        VisualKind::Sprite {
            image: spec.image.clone(),
        },
        spec.position,
        props(spec, base_depth),
    );
    PlacedObject {
        spec: spec.clone(),
        handle,
        home: spec.position,
    }
}

fn update(
    presenter: &mut dyn Presenter,
    object: &mut PlacedObject,
    spec: &InteractiveObjectSpec,
    base_depth: i32,
) {
    if object.spec.image != spec.image {
        presenter.destroy_visual(object.handle);
        *object = create(presenter, spec, base_depth);
        return;
    }
    if object.spec.position != spec.position {
        presenter.animate_property(object.handle, AnimatedProperty::Position(spec.position), 0);
    }
    if object.spec.size_percent != spec.size_percent {
        presenter.animate_property(object.handle, AnimatedProperty::Size(spec.size_percent), 0);
    }
    if object.spec.depth != spec.depth {
        presenter.animate_property(
            object.handle,
            AnimatedProperty::Depth(base_depth + spec.depth),
            0,
        );
    }
    // Role changes need no visual work; listening is set per step.
    object.spec = spec.clone();
    object.home = spec.position;
}

//=========================================================================
// Unit Tests
//=========================================================================
