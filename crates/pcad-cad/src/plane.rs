//! Datum planes and rotation axes

use glam::DVec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::id::PlaneId;

/// The three world datum planes every part studio starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DatumPlaneKind {
    /// Top, normal +Z
    #[default]
    XY,
    /// Front, normal -Y
    XZ,
    /// Right, normal +X
    YZ,
}

impl DatumPlaneKind {
    /// Stable id shared by every part studio
    pub const fn id(&self) -> PlaneId {
        match self {
            DatumPlaneKind::XY => PlaneId(Uuid::from_u128(0x01)),
            DatumPlaneKind::XZ => PlaneId(Uuid::from_u128(0x02)),
            DatumPlaneKind::YZ => PlaneId(Uuid::from_u128(0x03)),
        }
    }

    pub fn all() -> [DatumPlaneKind; 3] {
        [DatumPlaneKind::XY, DatumPlaneKind::XZ, DatumPlaneKind::YZ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            DatumPlaneKind::XY => "Top",
            DatumPlaneKind::XZ => "Front",
            DatumPlaneKind::YZ => "Right",
        }
    }
}

/// A plane sketches can be placed on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub id: PlaneId,
    pub name: String,
    pub origin: DVec3,
    pub normal: DVec3,
    /// Local X axis, in-plane
    pub x_axis: DVec3,
    /// Local Y axis, `normal × x_axis`
    pub y_axis: DVec3,
}

impl Plane {
    /// Create a plane from an origin, a normal and an in-plane X direction
    pub fn new(name: impl Into<String>, origin: DVec3, normal: DVec3, x_axis: DVec3) -> Self {
        let normal = normal.normalize();
        let x_axis = x_axis.normalize();
        Self {
            id: PlaneId::new(),
            name: name.into(),
            origin,
            normal,
            x_axis,
            y_axis: normal.cross(x_axis),
        }
    }

    /// One of the world datum planes
    pub fn datum(kind: DatumPlaneKind) -> Self {
        let (normal, x_axis, y_axis) = match kind {
            DatumPlaneKind::XY => (DVec3::Z, DVec3::X, DVec3::Y),
            DatumPlaneKind::XZ => (DVec3::NEG_Y, DVec3::X, DVec3::Z),
            DatumPlaneKind::YZ => (DVec3::X, DVec3::Y, DVec3::Z),
        };
        Self {
            id: kind.id(),
            name: kind.name().to_string(),
            origin: DVec3::ZERO,
            normal,
            x_axis,
            y_axis,
        }
    }

    pub fn xy() -> Self {
        Self::datum(DatumPlaneKind::XY)
    }

    pub fn xz() -> Self {
        Self::datum(DatumPlaneKind::XZ)
    }

    pub fn yz() -> Self {
        Self::datum(DatumPlaneKind::YZ)
    }
}

/// An axis in 3D space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis3D {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Axis3D {
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }
}

/// Which axis a revolve spins around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisChoice {
    /// World X through the origin
    #[default]
    WorldX,
    /// World Y through the origin
    WorldY,
    /// The sketch plane's local X axis
    SketchX,
    /// The sketch plane's local Y axis
    SketchY,
}

/// Origin and direction of `choice`, reading local axes from `plane`
pub fn resolve_axis(choice: AxisChoice, plane: &Plane) -> Axis3D {
    match choice {
        AxisChoice::WorldX => Axis3D::new(DVec3::ZERO, DVec3::X),
        AxisChoice::WorldY => Axis3D::new(DVec3::ZERO, DVec3::Y),
        AxisChoice::SketchX => Axis3D::new(plane.origin, plane.x_axis),
        AxisChoice::SketchY => Axis3D::new(plane.origin, plane.y_axis),
    }
}
