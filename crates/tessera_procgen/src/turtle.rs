use glam::{Mat4, Quat, Vec2, Vec3};
use tessera_core::{GenerationError, MeshBuilder, MeshGeometry};
use thiserror::Error;

/// Thickness multiplier applied when a branch opens
pub const BRANCH_NARROWING: f32 = 0.7;

/// `]` with nothing on the state stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unbalanced branch: `]` at symbol {index} pops an empty stack")]
pub struct UnbalancedBranchError {
    /// Character offset of the offending `]`
    pub index: usize,
}

impl From<UnbalancedBranchError> for GenerationError {
    fn from(err: UnbalancedBranchError) -> Self {
        GenerationError::UnbalancedBranch { index: err.index }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurtleParams {
    /// Distance moved per `F`
    pub length: f32,
    pub angle_degrees: f32,
    /// Thickness of the trunk before any branching
    pub thickness: f32,
}

/// One drawn element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
    pub thickness: f32,
}

impl Segment {
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    pub fn midpoint(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }

    pub fn direction(&self) -> Vec3 {
        (self.end - self.start).normalize_or_zero()
    }

    /// Transform placing a unit primitive (height 2 along +Y, centered on
    /// the origin) over this segment.
    pub fn instance_transform(&self) -> Mat4 {
        let direction = self.direction();
        let rotation = if direction == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            Quat::from_rotation_arc(Vec3::Y, direction)
        };
        let scale = Vec3::new(self.thickness, self.length() * 0.5, self.thickness);
        Mat4::from_scale_rotation_translation(scale, rotation, self.midpoint())
    }
}

/// Turtle state for interpreting L-System commands
#[derive(Debug, Clone, Copy)]
struct TurtleState {
    position: Vec3,
    orientation: Quat,
    thickness: f32,
}

impl TurtleState {
    fn new(thickness: f32) -> Self {
        TurtleState {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            thickness,
        }
    }

    fn heading(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    /// Rotate about an axis of the turtle's own frame
    fn turn(&mut self, local_axis: Vec3, degrees: f32) {
        let rotation = Quat::from_axis_angle(local_axis, degrees.to_radians());
        self.orientation = (self.orientation * rotation).normalize();
    }
}

/// Walk an expanded string and emit one segment per `F`.
///
/// `+`/`-` turn about the local Z axis, `&`/`^` pitch about local X, `\`/`/`
/// roll about local Y, `|` rolls 180° about the heading axis (local Y).
/// `[` saves the state and narrows the branch, `]` restores the last saved
/// state.
pub fn interpret(symbols: &str, params: &TurtleParams) -> Result<Vec<Segment>, UnbalancedBranchError> {
    let angle = params.angle_degrees;
    let mut turtle = TurtleState::new(params.thickness);
    let mut stack: Vec<TurtleState> = Vec::new();
    let mut segments = Vec::new();

    for (index, ch) in symbols.chars().enumerate() {
        match ch {
            'F' => {
                let start = turtle.position;
                let end = start + turtle.heading() * params.length;
                segments.push(Segment {
                    start,
                    end,
                    thickness: turtle.thickness,
                });
                turtle.position = end;
            }
            '+' => turtle.turn(Vec3::Z, angle),
            '-' => turtle.turn(Vec3::Z, -angle),
            '&' => turtle.turn(Vec3::X, -angle),
            '^' => turtle.turn(Vec3::X, angle),
            '\\' => turtle.turn(Vec3::Y, -angle),
            '/' => turtle.turn(Vec3::Y, angle),
            '|' => turtle.turn(Vec3::Y, 180.0),
            '[' => {
                stack.push(turtle);
                turtle.thickness *= BRANCH_NARROWING;
            }
            ']' => {
                turtle = stack.pop().ok_or(UnbalancedBranchError { index })?;
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        log::debug!("{} branches left open at end of input", stack.len());
    }

    Ok(segments)
}

/// Sweep every segment into an open cylinder, for renderers that take one
/// mesh instead of instancing a primitive per segment.
pub fn build_branch_mesh(segments: &[Segment], radial_segments: u32) -> MeshGeometry {
    let radial = radial_segments.max(3);
    let mut builder = MeshBuilder::new();
    let group = builder.add_submesh("branches");

    for segment in segments {
        if segment.length() <= f32::EPSILON {
            continue;
        }

        let direction = segment.direction();
        let arbitrary = if direction.y.abs() > 0.9 { Vec3::X } else { Vec3::Y };
        let tangent = direction.cross(arbitrary).normalize();
        let bitangent = direction.cross(tangent).normalize();
        let radius = segment.thickness * 0.5;

        let base = builder.vertex_count();

        // Ring at the start, then ring at the end
        for (ring, center) in [segment.start, segment.end].into_iter().enumerate() {
            for i in 0..radial {
                let t = i as f32 / radial as f32;
                let angle = t * std::f32::consts::TAU;
                let normal = tangent * angle.cos() + bitangent * angle.sin();
                builder.add_vertex(center + normal * radius, Vec2::new(t, ring as f32));
            }
        }

        for i in 0..radial {
            let next = (i + 1) % radial;
            let i0 = base + i;
            let i1 = base + next;
            let i2 = base + radial + i;
            let i3 = base + radial + next;

            builder.add_triangle(group, i0, i1, i2);
            builder.add_triangle(group, i1, i3, i2);
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(length: f32, angle: f32, thickness: f32) -> TurtleParams {
        TurtleParams {
            length,
            angle_degrees: angle,
            thickness,
        }
    }

    fn assert_close(a: Vec3, b: Vec3) {
        assert!(a.abs_diff_eq(b, 1e-5), "{a:?} != {b:?}");
    }

    #[test]
    fn test_single_forward() {
        let segments = interpret("F", &params(2.0, 45.0, 1.0)).unwrap();
        assert_eq!(segments.len(), 1);
        assert_close(segments[0].start, Vec3::ZERO);
        assert_close(segments[0].end, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(segments[0].thickness, 1.0);
    }

    #[test]
    fn test_branch_restores_position() {
        let segments = interpret("F[+F]F", &params(1.0, 45.0, 1.0)).unwrap();
        assert_eq!(segments.len(), 3);
        assert_close(segments[1].start, segments[0].end);
        assert_close(segments[2].start, segments[0].end);
        // Trunk continues straight up after the branch closes
        assert_close(segments[2].end, Vec3::new(0.0, 2.0, 0.0));
        // Branch is narrower, trunk thickness is restored
        assert!((segments[1].thickness - BRANCH_NARROWING).abs() < 1e-6);
        assert_eq!(segments[2].thickness, 1.0);
    }

    #[test]
    fn test_underflow_is_an_error() {
        assert_eq!(
            interpret("]", &params(1.0, 45.0, 1.0)),
            Err(UnbalancedBranchError { index: 0 })
        );
        assert_eq!(
            interpret("F[F]]F", &params(1.0, 45.0, 1.0)),
            Err(UnbalancedBranchError { index: 4 })
        );

        let err: GenerationError = UnbalancedBranchError { index: 4 }.into();
        assert_eq!(err, GenerationError::UnbalancedBranch { index: 4 });
    }

    #[test]
    fn test_turns_stay_in_their_planes() {
        let p = params(1.0, 90.0, 1.0);

        // Yaw about local Z: +90 sends heading from +Y to -X
        let yaw = interpret("+F", &p).unwrap();
        assert_close(yaw[0].end, Vec3::new(-1.0, 0.0, 0.0));
        let yaw = interpret("-F", &p).unwrap();
        assert_close(yaw[0].end, Vec3::new(1.0, 0.0, 0.0));

        // Pitch about local X
        let pitch = interpret("^F", &p).unwrap();
        assert_close(pitch[0].end, Vec3::new(0.0, 0.0, 1.0));
        let pitch = interpret("&F", &p).unwrap();
        assert_close(pitch[0].end, Vec3::new(0.0, 0.0, -1.0));

        // Roll about the heading leaves the heading alone
        let roll = interpret("/\\|F", &p).unwrap();
        assert_close(roll[0].end, Vec3::Y);
    }

    #[test]
    fn test_rotations_compose_locally() {
        // Roll 90 then yaw: the yaw axis was rolled onto world X
        let p = params(1.0, 90.0, 1.0);
        let segments = interpret("/+F", &p).unwrap();
        assert_close(segments[0].end, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_bar_rolls_about_heading() {
        let p = params(1.0, 90.0, 1.0);
        let straight = interpret("|F", &p).unwrap();
        assert_close(straight[0].end, Vec3::Y);

        // After the roll, `+` turns the other way
        let turned = interpret("|+F", &p).unwrap();
        assert_close(turned[0].end, Vec3::X);
        let plain = interpret("+F", &p).unwrap();
        assert_close(plain[0].end, Vec3::NEG_X);
    }

    #[test]
    fn test_unknown_symbols_are_ignored() {
        let segments = interpret("XfF?Y", &params(1.0, 30.0, 1.0)).unwrap();
        assert_eq!(segments.len(), 1);
        assert_close(segments[0].start, Vec3::ZERO);
    }

    #[test]
    fn test_nested_narrowing() {
        let segments = interpret("[[F]]", &params(1.0, 30.0, 2.0)).unwrap();
        assert!((segments[0].thickness - 2.0 * 0.7 * 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_instance_transform() {
        let segment = Segment {
            start: Vec3::new(1.0, 0.0, 0.0),
            end: Vec3::new(1.0, 4.0, 0.0),
            thickness: 0.5,
        };
        let m = segment.instance_transform();
        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        assert_close(translation, Vec3::new(1.0, 2.0, 0.0));
        assert_close(scale, Vec3::new(0.5, 2.0, 0.5));
        assert_close(rotation * Vec3::Y, Vec3::Y);

        // Unit primitive's top lands on the segment end
        assert_close(m.transform_point3(Vec3::Y), segment.end);
    }

    #[test]
    fn test_branch_mesh_faces_outward() {
        let segments = interpret("F", &params(2.0, 45.0, 1.0)).unwrap();
        let mesh = build_branch_mesh(&segments, 6);

        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.validate().is_ok());

        let indices = mesh.all_indices();
        for (tri, normal) in indices.chunks_exact(3).zip(mesh.face_normals()) {
            let centroid = tri
                .iter()
                .map(|&i| Vec3::from_array(mesh.vertices[i as usize]))
                .sum::<Vec3>()
                / 3.0;
            let outward = Vec3::new(centroid.x, 0.0, centroid.z);
            assert!(normal.dot(outward) > 0.0);
        }
    }

    #[test]
    fn test_branch_mesh_skips_degenerate() {
        let segments = interpret("F", &params(0.0, 45.0, 1.0)).unwrap();
        let mesh = build_branch_mesh(&segments, 4);
        assert_eq!(mesh.vertex_count(), 0);
    }
}
