//! End-to-end checks driving one body through a motor with a small
//! position-stabilized velocity-projection stepper.

use motorlink::dynamics::{
    BodyHandle, BodySet, ConstantLaw, LinearMotorForce, LinearMotorPosition, LinearMotorSpeed,
    MotorConstraint, MotorSet, RampLaw, RigidBodyState, RotationMotorAngle, RotationMotorSpeed,
    SystemDescriptor,
};
use motorlink::math::{DVector, Isometry, Real, Rotation, Vector};
use motorlink::na::{Matrix6, Vector6};
use std::sync::Arc;

/// Advances one step of a fully locked (6-row) motor connecting a dynamic
/// body 1 to a static body 2, by solving `J v = -Ct - C/dt` for body 1's
/// spatial velocity and integrating its pose.
fn step(motor: &mut dyn MotorConstraint, bodies: &mut BodySet, b1: BodyHandle, t: Real, dt: Real) {
    motor.update(t, bodies);

    let rows = motor.constraint_rows();
    assert_eq!(rows.len(), 6);

    let mut qc = DVector::zeros(6);
    motor.load_constraint_time_derivative(0, &mut qc, 1.0);

    let mut j = Matrix6::<Real>::zeros();
    let mut rhs = Vector6::<Real>::zeros();
    for (i, row) in rows.iter().enumerate() {
        for k in 0..3 {
            j[(i, k)] = row.jac1.lin[k];
            j[(i, 3 + k)] = row.jac1.ang[k];
        }
        rhs[i] = -qc[i] - row.c / dt;
    }
    let v = j.lu().solve(&rhs).unwrap();

    // Auxiliary coordinates have unit mass: forward-integrate their residual
    // force directly.
    if motor.extra_state_size() == 1 {
        let mut r = DVector::zeros(1);
        motor.load_residual_forces(0, &mut r, 1.0, bodies);
        let mut x = DVector::zeros(1);
        let mut w = DVector::zeros(1);
        let mut t_out = 0.0;
        motor.gather_state(0, &mut x, 0, &mut w, &mut t_out);
        w[0] += r[0] * dt;
        motor.scatter_state(0, &x, 0, &w, t + dt);
    }

    let linvel = Vector::new(v[0], v[1], v[2]);
    let angvel = Vector::new(v[3], v[4], v[5]);
    let body = &mut bodies[b1];
    body.position.translation.vector += linvel * dt;
    body.position.rotation = Rotation::from_scaled_axis(angvel * dt) * body.position.rotation;
    body.linvel = linvel;
    body.angvel = angvel;
}

fn single_body_scene() -> (BodySet, BodyHandle, BodyHandle) {
    let mut bodies = BodySet::new();
    let b1 = bodies.insert(RigidBodyState::default());
    let b2 = bodies.insert(RigidBodyState::default());
    (bodies, b1, b2)
}

#[test]
fn position_motor_tracks_a_ramp() {
    let (mut bodies, b1, b2) = single_body_scene();
    let mut motor = LinearMotorPosition::new(b1, b2, Isometry::identity(), Isometry::identity());
    motor.set_motion_law(Arc::new(RampLaw::new(0.0, 2.0)));

    let dt = 0.01;
    let mut t = 0.0;
    for _ in 0..100 {
        step(&mut motor, &mut bodies, b1, t, dt);
        t += dt;
    }

    // After 1 second at 2 units/s the body sits at x = 2.
    approx::assert_relative_eq!(bodies[b1].position.translation.x, 2.0, epsilon = 1.0e-6);
    approx::assert_relative_eq!(bodies[b1].position.translation.y, 0.0, epsilon = 1.0e-9);
    motor.update(t, &bodies);
    approx::assert_relative_eq!(motor.base.actual_pos(), 2.0, epsilon = 1.0e-6);
    approx::assert_relative_eq!(motor.base.actual_vel(), 2.0, epsilon = 1.0e-6);
}

#[test]
fn speed_motor_displacement_is_the_integrated_speed() {
    let (mut bodies, b1, b2) = single_body_scene();
    let mut motor = LinearMotorSpeed::new(b1, b2, Isometry::identity(), Isometry::identity());
    motor.set_speed_law(Arc::new(ConstantLaw(3.0)));

    let dt = 0.01;
    let mut t = 0.0;
    for _ in 0..100 {
        step(&mut motor, &mut bodies, b1, t, dt);
        t += dt;
    }

    approx::assert_relative_eq!(bodies[b1].position.translation.x, 3.0, epsilon = 1.0e-6);
    approx::assert_relative_eq!(motor.aux_state(), 3.0, epsilon = 1.0e-9);
}

#[test]
fn drift_avoidance_recovers_a_position_disturbance() {
    let run = |avoid: bool| -> Real {
        let (mut bodies, b1, b2) = single_body_scene();
        let mut motor = LinearMotorSpeed::new(b1, b2, Isometry::identity(), Isometry::identity());
        motor.set_speed_law(Arc::new(ConstantLaw(3.0)));
        motor.set_avoid_position_drift(avoid);

        let dt = 0.01;
        let mut t = 0.0;
        for k in 0..100 {
            // Teleport the body off the trajectory halfway through.
            if k == 50 {
                bodies[b1].position.translation.x += 0.1;
            }
            step(&mut motor, &mut bodies, b1, t, dt);
            t += dt;
        }
        bodies[b1].position.translation.x
    };

    // The drift closure pulls the body back onto the integrated target; the
    // pure velocity governor keeps the offset forever.
    approx::assert_relative_eq!(run(true), 3.0, epsilon = 1.0e-6);
    approx::assert_relative_eq!(run(false), 3.1, epsilon = 1.0e-6);
}

#[test]
fn angle_motor_tracks_a_ramp() {
    let (mut bodies, b1, b2) = single_body_scene();
    let mut motor = RotationMotorAngle::new(b1, b2, Isometry::identity(), Isometry::identity());
    motor.set_motion_law(Arc::new(RampLaw::new(0.0, 1.5)));

    let dt = 0.01;
    let mut t = 0.0;
    for _ in 0..100 {
        step(&mut motor, &mut bodies, b1, t, dt);
        t += dt;
    }

    let angle = bodies[b1].position.rotation.scaled_axis().z;
    approx::assert_relative_eq!(angle, 1.5, epsilon = 1.0e-5);
    motor.update(t, &bodies);
    approx::assert_relative_eq!(motor.base.actual_rot(), 1.5, epsilon = 1.0e-5);
    approx::assert_relative_eq!(motor.base.actual_rot_dt(), 1.5, epsilon = 1.0e-5);
}

#[test]
fn rotation_speed_motor_winds_past_a_full_turn() {
    let (mut bodies, b1, b2) = single_body_scene();
    let mut motor = RotationMotorSpeed::new(b1, b2, Isometry::identity(), Isometry::identity());
    motor.set_speed_law(Arc::new(ConstantLaw(2.0)));

    let dt = 0.005;
    let mut t = 0.0;
    for _ in 0..800 {
        step(&mut motor, &mut bodies, b1, t, dt);
        t += dt;
    }

    // 4 seconds at 2 rad/s: 8 radians, more than a full turn. The auxiliary
    // target is unwrapped; the pose only exposes the principal angle.
    approx::assert_relative_eq!(motor.aux_state(), 8.0, epsilon = 1.0e-9);
    let angle = bodies[b1].position.rotation.scaled_axis().z;
    let expected = 8.0 - 2.0 * std::f64::consts::PI;
    approx::assert_relative_eq!(angle, expected, epsilon = 1.0e-4);
}

#[test]
fn force_motor_accelerates_a_free_axis() {
    let (mut bodies, b1, b2) = single_body_scene();
    bodies[b1].solver_offset = 0;
    bodies[b2].solver_offset = 6;
    let mut motor = LinearMotorForce::new(b1, b2, Isometry::identity(), Isometry::identity());
    motor.set_force_law(Arc::new(ConstantLaw(4.0)));

    // Unit-mass body pushed along the free X axis: x = F t^2 / 2.
    let dt = 0.001;
    let mut t = 0.0;
    let mut vel = 0.0;
    for _ in 0..1000 {
        motor.update(t, &bodies);
        let mut r = DVector::zeros(12);
        motor.load_residual_forces(0, &mut r, 1.0, &bodies);
        vel += r[0] * dt;
        bodies[b1].position.translation.x += vel * dt;
        t += dt;
    }
    approx::assert_relative_eq!(bodies[b1].position.translation.x, 2.0, epsilon = 1.0e-2);
}

#[test]
fn motor_set_assembles_auxiliary_variables() {
    let (bodies, b1, b2) = single_body_scene();
    let mut motors = MotorSet::new();

    motors.insert(LinearMotorPosition::new(
        b1,
        b2,
        Isometry::identity(),
        Isometry::identity(),
    ));
    let speed = motors.insert(LinearMotorSpeed::new(
        b1,
        b2,
        Isometry::identity(),
        Isometry::identity(),
    ));
    motors.insert(RotationMotorSpeed::new(
        b1,
        b2,
        Isometry::identity(),
        Isometry::identity(),
    ));

    assert_eq!(motors.total_extra_state_size(), 2);

    let mut descriptor = SystemDescriptor::new();
    motors.inject_all_variables(&mut descriptor);
    assert_eq!(descriptor.n_variables(), 2);

    motors.update_all(0.0, &bodies);
    for motor in motors.iter() {
        assert!(motor.is_enabled());
    }

    // Removal frees the handle's slot without disturbing the others.
    assert!(motors.remove(speed).is_some());
    assert!(motors.get(speed).is_none());
    assert_eq!(motors.total_extra_state_size(), 1);
}
