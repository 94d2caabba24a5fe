use arbor::{
    Camera, Color, Light, Quat, RotationNode, SceneGraph, SlerpNode, Stage, TextureRef, Transform,
    Vec3, run,
};

fn main() {
    env_logger::init();

    let mut scene = SceneGraph::new();
    let root = scene.add_group(Transform::identity());

    // A glowing sphere at the center.
    let sun_mount = scene.add_group(Transform::scaling(Vec3::splat(1.5)));
    let sun = scene.add_sphere(Color::rgb(0.9, 0.7, 0.2));
    scene.attach(root, sun_mount).unwrap();
    scene.attach(sun_mount, sun).unwrap();

    // A smaller sphere orbiting it: the rotation animation spins the
    // orbit group, the arm group offsets the planet from the center.
    let orbit = scene.add_group(Transform::identity());
    let arm = scene.add_group(Transform::translation(Vec3::new(4.0, 0.0, 0.0)));
    let planet_mount = scene.add_group(Transform::scaling(Vec3::splat(0.6)));
    let planet = scene.add_sphere(Color::rgb(0.2, 0.4, 0.9));
    scene.attach(root, orbit).unwrap();
    scene.attach(orbit, arm).unwrap();
    scene.attach(arm, planet_mount).unwrap();
    scene.attach(planet_mount, planet).unwrap();

    // A plain box off to the side.
    let box_mount = scene.add_group(Transform::sqt(
        Vec3::splat(0.8),
        Quat::IDENTITY,
        Vec3::new(-3.0, 1.8, 0.0),
    ));
    let aa_box = scene.add_aa_box(Color::rgb(0.3, 0.8, 0.4));
    scene.attach(root, box_mount).unwrap();
    scene.attach(box_mount, aa_box).unwrap();

    // A checkered box swinging between two rotations via slerp.
    let pedestal = scene.add_group(Transform::sqt(
        Vec3::splat(1.2),
        Quat::IDENTITY,
        Vec3::new(0.0, -2.5, 0.0),
    ));
    let crate_box = scene.add_texture_box(TextureRef::Checker {
        cell: 8,
        light: Color::rgb(0.9, 0.85, 0.7),
        dark: Color::rgb(0.35, 0.25, 0.15),
    });
    scene.attach(root, pedestal).unwrap();
    scene.attach(pedestal, crate_box).unwrap();

    let mut stage = Stage::new(scene, root);
    stage.camera = Camera::new()
        .at(Vec3::new(0.0, 2.0, 10.0))
        .looking_at(Vec3::ZERO);
    stage.lights = vec![Light::at(5.0, 5.0, 5.0), Light::at(-5.0, 3.0, 5.0)];
    stage.animations.push(RotationNode::new(orbit, Vec3::Y).into());
    stage.animations.push(
        SlerpNode::new(
            pedestal,
            Quat::IDENTITY,
            Quat::from_rotation_y(std::f32::consts::PI / 2.0),
        )
        .into(),
    );

    // Animations start paused; space toggles them at runtime.
    stage.toggle_animations();

    if let Err(e) = run(stage) {
        log::error!("event loop error: {e}");
    }
}
