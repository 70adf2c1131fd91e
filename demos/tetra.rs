//! Build a tetrahedron trace end to end and query it, without a window.

use bevy::prelude::*;
use meshplot::prelude::*;

fn main() {
    let mut scene = Scene3d::new();
    let mut meshes = Assets::<Mesh>::default();
    let mut materials = Assets::<StandardMaterial>::default();

    let spec = TraceSpec::new(
        vec![0.0, 1.0, 0.0, 0.0],
        vec![0.0, 0.0, 1.0, 0.0],
        vec![0.0, 0.0, 0.0, 1.0],
    )
    .with_name("tetrahedron")
    .with_alphahull(0.0)
    .with_color("#ff0000")
    .with_contour(Contour {
        show: true,
        color: "#444".into(),
        width: 2.0,
    });

    let mut trace = Mesh3dTrace::create(&mut scene, &mut meshes, &mut materials, &spec)
        .expect("tetrahedron reconstructs");

    let mesh = meshes.get(trace.mesh()).unwrap();
    println!(
        "mesh: {} vertices, {} triangles",
        mesh.count_vertices(),
        mesh.indices().map_or(0, |i| i.len() / 3)
    );
    let contour = meshes.get(trace.contour_mesh()).unwrap();
    println!("contour: {} edges", contour.count_vertices() / 2);

    let hit = PickHit {
        object: trace.object(),
        index: 2,
    };
    if let Ok(Some([x, y, z])) = trace.handle_pick(&hit) {
        println!("pick on vertex 2 -> ({x}, {y}, {z})");
    }

    trace
        .dispose(&mut scene, &mut meshes, &mut materials)
        .expect("first dispose succeeds");
    println!("disposed; scene now holds {} objects", scene.objects().len());
}
