use anyhow::{anyhow, bail, Context, Result};
use glam::{Vec2, Vec3};
use roxmltree::{Document, Node};

use super::SceneGraph;
use crate::assets::AssetRequest;
use crate::color;
use crate::config::{EngineConfig, LightConfig, Preset};
use crate::factory::GeometryFactory;
use crate::geometry::{
    heart, Bevel, BoxParams, CircleParams, ConeParams, CylinderParams, ExtrudeParams,
    PlaneParams, PolyhedronParams, PrimitiveKind, PrimitiveParams, Shape, SphereParams,
    TextStyle, Topology, TorusKnotParams, TorusParams, WireframeParams,
};
use crate::material::{ColorPolicy, Side};

/// Primitive declared in a manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    pub params: PrimitiveParams,
    pub grid: Vec2,
    pub color: ColorPolicy,
    pub side: Option<Side>,
}

/// Geometry that has to be fetched before it can be placed.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetEntry {
    pub request: AssetRequest,
    pub grid: Vec2,
    pub color: ColorPolicy,
}

/// Scene description read from XML.
///
/// ```xml
/// <scene preset="primitives">
///   <config spread="15" background="#ffffff"/>
///   <object kind="box" x="-2" y="2" width="8" height="8" depth="8"/>
///   <asset kind="mesh" url="models/windmill.obj" x="0" y="-2"/>
/// </scene>
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SceneManifest {
    pub config: EngineConfig,
    pub objects: Vec<ObjectEntry>,
    pub assets: Vec<AssetEntry>,
}

impl SceneManifest {
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        if !root.has_tag_name("scene") {
            bail!("root element must be <scene>, found <{}>", root.tag_name().name());
        }

        let preset = match root.attribute("preset") {
            Some(name) => name.parse::<Preset>()?,
            None => Preset::default(),
        };
        let mut config = EngineConfig::preset(preset);
        let mut lights = Vec::new();
        let mut objects = Vec::new();
        let mut assets = Vec::new();

        for node in root.children().filter(Node::is_element) {
            let line = document.text_pos_at(node.range().start).row;
            match node.tag_name().name() {
                "config" => apply_config(&node, &mut config)
                    .with_context(|| format!("<config> on line {line}"))?,
                "camera" => apply_camera(&node, &mut config)
                    .with_context(|| format!("<camera> on line {line}"))?,
                "light" => lights.push(
                    parse_light(&node).with_context(|| format!("<light> on line {line}"))?,
                ),
                "object" => objects.push(
                    parse_object(&node).with_context(|| format!("<object> on line {line}"))?,
                ),
                "asset" => assets.push(
                    parse_asset(&node).with_context(|| format!("<asset> on line {line}"))?,
                ),
                other => log::warn!("ignoring unknown element <{other}> on line {line}"),
            }
        }

        if !lights.is_empty() {
            config.lights = lights;
        }

        Ok(Self {
            config,
            objects,
            assets,
        })
    }

    /// Builds the scene graph with every declared object placed.
    pub fn instantiate(&self, factory: &mut GeometryFactory) -> Result<SceneGraph> {
        let mut scene = SceneGraph::from_config(&self.config);
        for (index, entry) in self.objects.iter().enumerate() {
            let geometry = factory
                .create_primitive(&entry.params)
                .with_context(|| format!("object {index} ({})", entry.params.kind()))?;
            let mut material = factory
                .create_material(entry.color)
                .with_context(|| format!("object {index} material"))?;
            if let Some(side) = entry.side {
                material.side = side;
            }
            material.wireframe = geometry.topology() == Topology::Lines;
            factory.place_at(
                &mut scene,
                entry.grid.x,
                entry.grid.y,
                geometry.into_shared(),
                material,
            );
        }
        Ok(scene)
    }
}

fn apply_config(node: &Node<'_, '_>, config: &mut EngineConfig) -> Result<()> {
    config.spread = attr_f32(node, "spread", config.spread)?;
    config.animation.base_speed = attr_f32(node, "base-speed", config.animation.base_speed)?;
    config.animation.speed_increment =
        attr_f32(node, "speed-increment", config.animation.speed_increment)?;
    match node.attribute("background") {
        Some("none") => config.background = None,
        Some(value) => config.background = Some(color::parse_hex(value)?),
        None => {}
    }
    Ok(())
}

fn apply_camera(node: &Node<'_, '_>, config: &mut EngineConfig) -> Result<()> {
    let camera = &mut config.camera;
    camera.fov = attr_f32(node, "fov", camera.fov)?;
    camera.aspect = attr_f32(node, "aspect", camera.aspect)?;
    camera.near = attr_f32(node, "near", camera.near)?;
    camera.far = attr_f32(node, "far", camera.far)?;
    camera.position = attr_vec3(node, "position", camera.position)?;
    if !(camera.near > 0.0 && camera.far > camera.near) {
        bail!("camera needs 0 < near < far, got {} and {}", camera.near, camera.far);
    }
    Ok(())
}

fn parse_light(node: &Node<'_, '_>) -> Result<LightConfig> {
    let position = attr_vec3(node, "position", Vec3::new(-1.0, 2.0, 4.0))?;
    let color = match node.attribute("color") {
        Some(value) => color::parse_hex(value)?,
        None => Vec3::ONE,
    };
    Ok(LightConfig {
        position,
        color,
        intensity: attr_f32(node, "intensity", 1.0)?,
    })
}

fn parse_object(node: &Node<'_, '_>) -> Result<ObjectEntry> {
    let kind = required(node, "kind")?.parse::<PrimitiveKind>()?;
    let params = primitive_params(node, kind)?;
    let default_color = if kind == PrimitiveKind::Wireframe {
        ColorPolicy::hex(0x000000)
    } else {
        ColorPolicy::default()
    };
    let side = match node.attribute("side") {
        Some("front") => Some(Side::Front),
        Some("back") => Some(Side::Back),
        Some("double") => Some(Side::Double),
        Some(other) => bail!("unknown side {other:?}"),
        None => None,
    };
    Ok(ObjectEntry {
        params,
        grid: grid(node)?,
        color: color_policy(node, default_color)?,
        side,
    })
}

fn parse_asset(node: &Node<'_, '_>) -> Result<AssetEntry> {
    let request = match required(node, "kind")? {
        "mesh" => AssetRequest::Mesh {
            url: required(node, "url")?.to_string(),
        },
        "text" => {
            let defaults = TextStyle::default();
            AssetRequest::Text {
                font_url: required(node, "font")?.to_string(),
                text: required(node, "text")?.to_string(),
                style: TextStyle {
                    size: attr_f32(node, "size", defaults.size)?,
                    depth: attr_f32(node, "depth", defaults.depth)?,
                    curve_segments: attr_u32(node, "curve-segments", defaults.curve_segments)?,
                    bevel: bevel(node, defaults.bevel)?,
                },
            }
        }
        other => bail!("unknown asset kind {other:?}, expected mesh or text"),
    };
    Ok(AssetEntry {
        request,
        grid: grid(node)?,
        color: color_policy(node, ColorPolicy::default())?,
    })
}

fn primitive_params(node: &Node<'_, '_>, kind: PrimitiveKind) -> Result<PrimitiveParams> {
    let params = match kind {
        PrimitiveKind::Box => {
            let d = BoxParams::default();
            PrimitiveParams::Box(BoxParams {
                width: attr_f32(node, "width", d.width)?,
                height: attr_f32(node, "height", d.height)?,
                depth: attr_f32(node, "depth", d.depth)?,
                width_segments: attr_u32(node, "width-segments", d.width_segments)?,
                height_segments: attr_u32(node, "height-segments", d.height_segments)?,
                depth_segments: attr_u32(node, "depth-segments", d.depth_segments)?,
            })
        }
        PrimitiveKind::CircleSector => {
            let d = CircleParams::default();
            PrimitiveParams::CircleSector(CircleParams {
                radius: attr_f32(node, "radius", d.radius)?,
                segments: attr_u32(node, "segments", d.segments)?,
                theta_start: attr_f32(node, "theta-start", d.theta_start)?,
                theta_length: attr_f32(node, "theta-length", d.theta_length)?,
            })
        }
        PrimitiveKind::Cone => {
            let d = ConeParams::default();
            PrimitiveParams::Cone(ConeParams {
                radius: attr_f32(node, "radius", d.radius)?,
                height: attr_f32(node, "height", d.height)?,
                radial_segments: attr_u32(node, "radial-segments", d.radial_segments)?,
                height_segments: attr_u32(node, "height-segments", d.height_segments)?,
                open_ended: attr_bool(node, "open-ended", d.open_ended)?,
            })
        }
        PrimitiveKind::Cylinder => {
            let d = CylinderParams::default();
            PrimitiveParams::Cylinder(CylinderParams {
                radius_top: attr_f32(node, "radius-top", d.radius_top)?,
                radius_bottom: attr_f32(node, "radius-bottom", d.radius_bottom)?,
                height: attr_f32(node, "height", d.height)?,
                radial_segments: attr_u32(node, "radial-segments", d.radial_segments)?,
                height_segments: attr_u32(node, "height-segments", d.height_segments)?,
                open_ended: attr_bool(node, "open-ended", d.open_ended)?,
            })
        }
        PrimitiveKind::Dodecahedron | PrimitiveKind::Icosahedron => {
            let d = PolyhedronParams::default();
            let params = PolyhedronParams {
                radius: attr_f32(node, "radius", d.radius)?,
                detail: attr_u32(node, "detail", d.detail)?,
            };
            if kind == PrimitiveKind::Dodecahedron {
                PrimitiveParams::Dodecahedron(params)
            } else {
                PrimitiveParams::Icosahedron(params)
            }
        }
        PrimitiveKind::Plane => {
            let d = PlaneParams::default();
            PrimitiveParams::Plane(PlaneParams {
                width: attr_f32(node, "width", d.width)?,
                height: attr_f32(node, "height", d.height)?,
                width_segments: attr_u32(node, "width-segments", d.width_segments)?,
                height_segments: attr_u32(node, "height-segments", d.height_segments)?,
            })
        }
        PrimitiveKind::Sphere => {
            let d = SphereParams::default();
            PrimitiveParams::Sphere(SphereParams {
                radius: attr_f32(node, "radius", d.radius)?,
                width_segments: attr_u32(node, "width-segments", d.width_segments)?,
                height_segments: attr_u32(node, "height-segments", d.height_segments)?,
            })
        }
        PrimitiveKind::Torus => {
            let d = TorusParams::default();
            PrimitiveParams::Torus(TorusParams {
                radius: attr_f32(node, "radius", d.radius)?,
                tube: attr_f32(node, "tube", d.tube)?,
                radial_segments: attr_u32(node, "radial-segments", d.radial_segments)?,
                tubular_segments: attr_u32(node, "tubular-segments", d.tubular_segments)?,
                arc: attr_f32(node, "arc", d.arc)?,
            })
        }
        PrimitiveKind::TorusKnot => {
            let d = TorusKnotParams::default();
            PrimitiveParams::TorusKnot(TorusKnotParams {
                radius: attr_f32(node, "radius", d.radius)?,
                tube: attr_f32(node, "tube", d.tube)?,
                tubular_segments: attr_u32(node, "tubular-segments", d.tubular_segments)?,
                radial_segments: attr_u32(node, "radial-segments", d.radial_segments)?,
                p: attr_u32(node, "p", d.p)?,
                q: attr_u32(node, "q", d.q)?,
            })
        }
        PrimitiveKind::ExtrudedShape => {
            let d = ExtrudeParams::default();
            let shape = match node.attribute("points") {
                Some(points) => Shape::from_points(&parse_points(points)?),
                None => heart(),
            };
            PrimitiveParams::ExtrudedShape(ExtrudeParams {
                shapes: vec![shape],
                depth: attr_f32(node, "depth", d.depth)?,
                steps: attr_u32(node, "steps", d.steps)?,
                curve_segments: attr_u32(node, "curve-segments", d.curve_segments)?,
                bevel: bevel(node, d.bevel)?,
            })
        }
        PrimitiveKind::Wireframe => {
            let source = required(node, "source")?.parse::<PrimitiveKind>()?;
            let source = primitive_params(node, source)?;
            let threshold = match node.attribute("threshold") {
                Some(value) => Some(parse_f32("threshold", value)?),
                None => None,
            };
            PrimitiveParams::Wireframe(WireframeParams {
                source: Box::new(source),
                threshold_angle: threshold,
            })
        }
        PrimitiveKind::Text => {
            bail!("text needs a font; declare it as <asset kind=\"text\" font=\"...\">")
        }
    };
    Ok(params)
}

fn bevel(node: &Node<'_, '_>, default: Option<Bevel>) -> Result<Option<Bevel>> {
    if !attr_bool(node, "bevel", default.is_some())? {
        return Ok(None);
    }
    let d = default.unwrap_or_default();
    Ok(Some(Bevel {
        thickness: attr_f32(node, "bevel-thickness", d.thickness)?,
        size: attr_f32(node, "bevel-size", d.size)?,
        offset: attr_f32(node, "bevel-offset", d.offset)?,
        segments: attr_u32(node, "bevel-segments", d.segments)?,
    }))
}

fn grid(node: &Node<'_, '_>) -> Result<Vec2> {
    Ok(Vec2::new(attr_f32(node, "x", 0.0)?, attr_f32(node, "y", 0.0)?))
}

fn color_policy(node: &Node<'_, '_>, default: ColorPolicy) -> Result<ColorPolicy> {
    if let Some(value) = node.attribute("color") {
        return Ok(ColorPolicy::Fixed(color::parse_hex(value)?));
    }
    let saturation = node.attribute("saturation");
    let luminance = node.attribute("luminance");
    if saturation.is_none() && luminance.is_none() {
        return Ok(default);
    }
    Ok(ColorPolicy::RandomHue {
        saturation: saturation.map_or(Ok(1.0), |v| parse_f32("saturation", v))?,
        luminance: luminance.map_or(Ok(0.5), |v| parse_f32("luminance", v))?,
    })
}

fn required<'a>(node: &Node<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("`{name}` attribute is missing"))
}

fn parse_f32(name: &str, value: &str) -> Result<f32> {
    value
        .trim()
        .parse::<f32>()
        .map_err(|err| anyhow!("`{name}`: failed to parse {value:?} as a number: {err}"))
}

fn attr_f32(node: &Node<'_, '_>, name: &str, default: f32) -> Result<f32> {
    node.attribute(name)
        .map_or(Ok(default), |value| parse_f32(name, value))
}

fn attr_u32(node: &Node<'_, '_>, name: &str, default: u32) -> Result<u32> {
    match node.attribute(name) {
        Some(value) => value
            .trim()
            .parse::<u32>()
            .map_err(|err| anyhow!("`{name}`: failed to parse {value:?} as a count: {err}")),
        None => Ok(default),
    }
}

fn attr_bool(node: &Node<'_, '_>, name: &str, default: bool) -> Result<bool> {
    match node.attribute(name).map(str::trim) {
        Some("true" | "yes" | "1") => Ok(true),
        Some("false" | "no" | "0") => Ok(false),
        Some(other) => bail!("`{name}`: expected true or false, got {other:?}"),
        None => Ok(default),
    }
}

fn attr_vec3(node: &Node<'_, '_>, name: &str, default: Vec3) -> Result<Vec3> {
    let Some(value) = node.attribute(name) else {
        return Ok(default);
    };
    let components = value
        .split_whitespace()
        .map(|c| parse_f32(name, c))
        .collect::<Result<Vec<_>>>()?;
    match components[..] {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => bail!("`{name}` needs 3 components, got {}", components.len()),
    }
}

/// `"x y, x y, ..."`
fn parse_points(value: &str) -> Result<Vec<Vec2>> {
    value
        .split(',')
        .map(|pair| {
            let numbers = pair
                .split_whitespace()
                .map(|c| parse_f32("points", c))
                .collect::<Result<Vec<_>>>()?;
            match numbers[..] {
                [x, y] => Ok(Vec2::new(x, y)),
                _ => bail!("point {pair:?} needs 2 components"),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SHOWCASE: &str = r##"
    <scene preset="primitives">
        <config spread="10" background="#000000"/>
        <camera fov="50" position="0 0 80"/>
        <light position="0 10 0" color="#ff8000" intensity="2"/>
        <object kind="box" x="-1" y="1" width="8" height="8" depth="8" color="#44aa88"/>
        <object kind="circle" x="1" radius="6" segments="24"/>
        <object kind="wireframe" source="box" threshold="1" width="4" height="4" depth="4"/>
        <object kind="extruded-shape" points="0 0, 4 0, 4 4" depth="1" bevel="false"/>
        <asset kind="text" font="fonts/helvetiker.json" text="hi" size="2" x="0" y="2"/>
        <asset kind="mesh" url="models/teapot.obj"/>
    </scene>
    "##;

    #[test]
    fn manifest_overrides_preset() {
        let manifest = SceneManifest::from_xml(SHOWCASE).unwrap();
        assert_eq!(manifest.config.spread, 10.0);
        assert_eq!(manifest.config.background, Some(Vec3::ZERO));
        assert_eq!(manifest.config.camera.fov, 50.0);
        assert_eq!(manifest.config.camera.far, 1000.0);
        assert_eq!(manifest.config.lights.len(), 1);
        assert_abs_diff_eq!(manifest.config.lights[0].intensity, 2.0);
        assert_eq!(manifest.objects.len(), 4);
        assert_eq!(manifest.assets.len(), 2);
    }

    #[test]
    fn object_attributes_map_to_parameters() {
        let manifest = SceneManifest::from_xml(SHOWCASE).unwrap();
        let first = &manifest.objects[0];
        assert_eq!(first.params, PrimitiveParams::Box(BoxParams::cube(8.0)));
        assert_eq!(first.grid, Vec2::new(-1.0, 1.0));
        assert_eq!(first.color, ColorPolicy::hex(0x44aa88));

        match &manifest.objects[2].params {
            PrimitiveParams::Wireframe(wire) => {
                assert_eq!(wire.threshold_angle, Some(1.0));
                assert_eq!(*wire.source, PrimitiveParams::Box(BoxParams::cube(4.0)));
            }
            other => panic!("expected wireframe, got {other:?}"),
        }
        assert_eq!(manifest.objects[2].color, ColorPolicy::hex(0x000000));

        match &manifest.assets[0].request {
            AssetRequest::Text { font_url, text, style } => {
                assert_eq!(font_url, "fonts/helvetiker.json");
                assert_eq!(text, "hi");
                assert_eq!(style.size, 2.0);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn instantiate_places_objects_on_grid() {
        let manifest = SceneManifest::from_xml(SHOWCASE).unwrap();
        let mut factory = GeometryFactory::with_seed(manifest.config.spread, 9);
        let scene = manifest.instantiate(&mut factory).unwrap();
        assert_eq!(scene.len(), 4);
        assert_eq!(scene.objects()[0].position, Vec3::new(-10.0, 10.0, 0.0));
        assert!(scene.objects()[2].material.wireframe);
        assert_eq!(scene.background(), Some(Vec3::ZERO));
    }

    #[test]
    fn invalid_parameters_fail_instantiation() {
        let xml = r#"<scene><object kind="sphere" radius="0"/></scene>"#;
        let manifest = SceneManifest::from_xml(xml).unwrap();
        let mut factory = GeometryFactory::with_seed(1.0, 0);
        let err = manifest.instantiate(&mut factory).unwrap_err();
        assert!(format!("{err:#}").contains("radius"));
    }

    #[test]
    fn parse_errors_carry_context() {
        let missing_kind = "<scene>\n<object x=\"1\"/>\n</scene>";
        let err = SceneManifest::from_xml(missing_kind).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("line 2"), "{message}");
        assert!(message.contains("kind"), "{message}");

        assert!(SceneManifest::from_xml("<world/>").is_err());
        assert!(SceneManifest::from_xml(r#"<scene preset="teapots"/>"#).is_err());
        assert!(SceneManifest::from_xml(r#"<scene><object kind="text"/></scene>"#).is_err());
    }
}
