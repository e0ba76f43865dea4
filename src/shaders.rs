//! Embedded GLSL sources.
//!
//! One shared vertex shader feeds every program; fragment shaders vary
//! per material. Sources omit the `#version` line, which the renderer
//! prepends per platform. Uniform names match the draw-state bag keys.

pub const BASIC_VERTEX: &str = r#"
    uniform mat4 PROJECTION_MATRIX;
    uniform mat4 VIEW_MATRIX;
    uniform mat4 MODEL_MATRIX;

    layout (location = 0) in vec3 position;
    layout (location = 1) in vec3 normal;
    layout (location = 2) in vec2 uv;
    layout (location = 3) in vec4 color;

    out vec3 v_position;
    out vec3 v_normal;
    out vec2 v_uv;
    out vec4 v_color;

    void main() {
        vec4 world = MODEL_MATRIX * vec4(position, 1.0);
        v_position = world.xyz;
        v_normal = normalize(mat3(MODEL_MATRIX) * normal);
        v_uv = uv;
        v_color = color;
        gl_Position = PROJECTION_MATRIX * VIEW_MATRIX * world;
    }
"#;

pub const BASIC_FRAGMENT: &str = r#"
    precision highp float;
    in vec3 v_normal;
    out vec4 out_color;

    uniform vec3 MODEL_COLOR;
    uniform vec3 LIGHT_DIRECTION;
    uniform vec3 LIGHT_COLOR;
    uniform vec3 AMBIENT_LIGHT_COLOR;
    uniform float AMBIENT_CONTRIBUTION;
    uniform float DIFFUSE_CONTRIBUTION;
    uniform float OUTPUT_ALPHA;

    void main() {
        vec3 normal = normalize(v_normal);
        float diffuse = max(dot(normal, LIGHT_DIRECTION), 0.0);
        vec3 color = MODEL_COLOR
            * ((AMBIENT_LIGHT_COLOR * AMBIENT_CONTRIBUTION)
                + (LIGHT_COLOR * DIFFUSE_CONTRIBUTION * diffuse));
        out_color = vec4(color, OUTPUT_ALPHA);
    }
"#;

pub const BASIC_TEXTURE_FRAGMENT: &str = r#"
    precision highp float;
    in vec3 v_position;
    in vec3 v_normal;
    in vec2 v_uv;
    out vec4 out_color;

    uniform sampler2D TEXTURE_SAMPLER;
    uniform vec3 MODEL_COLOR;
    uniform vec3 CAMERA_POSITION;
    uniform vec3 LIGHT_DIRECTION;
    uniform vec3 LIGHT_COLOR;
    uniform vec3 AMBIENT_LIGHT_COLOR;
    uniform float AMBIENT_CONTRIBUTION;
    uniform float DIFFUSE_CONTRIBUTION;
    uniform float SPECULAR_CONTRIBUTION;
    uniform float SPECULAR_EXPONENT;
    uniform float OUTPUT_ALPHA;

    void main() {
        vec3 normal = normalize(v_normal);
        float diffuse = max(dot(normal, LIGHT_DIRECTION), 0.0);
        vec3 view = normalize(CAMERA_POSITION - v_position);
        vec3 reflected = reflect(-LIGHT_DIRECTION, normal);
        float specular = pow(max(dot(view, reflected), 0.0), SPECULAR_EXPONENT);
        vec3 texel = texture(TEXTURE_SAMPLER, v_uv).rgb;
        vec3 color = texel * MODEL_COLOR
            * ((AMBIENT_LIGHT_COLOR * AMBIENT_CONTRIBUTION)
                + (LIGHT_COLOR * DIFFUSE_CONTRIBUTION * diffuse))
            + (LIGHT_COLOR * SPECULAR_CONTRIBUTION * specular * diffuse);
        out_color = vec4(color, OUTPUT_ALPHA);
    }
"#;

// Model color given on the 0-255 scale.
pub const COLOR_FRAGMENT: &str = r#"
    precision highp float;
    out vec4 out_color;

    uniform vec3 MODEL_COLOR;
    uniform float OUTPUT_ALPHA;

    void main() {
        out_color = vec4(MODEL_COLOR / 255.0, OUTPUT_ALPHA);
    }
"#;

pub const OVERLAY_FRAGMENT: &str = r#"
    precision highp float;
    in vec2 v_uv;
    out vec4 out_color;

    uniform sampler2D TEXTURE_SAMPLER;
    uniform float OUTPUT_ALPHA;

    void main() {
        vec4 texel = texture(TEXTURE_SAMPLER, v_uv);
        out_color = vec4(texel.rgb, texel.a * OUTPUT_ALPHA);
    }
"#;

pub const TEXTURE_FRAGMENT: &str = r#"
    precision highp float;
    in vec2 v_uv;
    out vec4 out_color;

    uniform sampler2D TEXTURE_SAMPLER;
    uniform float OUTPUT_ALPHA;

    void main() {
        out_color = vec4(texture(TEXTURE_SAMPLER, v_uv).rgb, OUTPUT_ALPHA);
    }
"#;

pub const EARTH_FRAGMENT: &str = r#"
    precision highp float;
    in vec3 v_position;
    in vec3 v_normal;
    in vec2 v_uv;
    out vec4 out_color;

    uniform sampler2D DAY_TX_SAMPLER;
    uniform sampler2D NIGHT_TX_SAMPLER;
    uniform sampler2D SPECULAR_MAP_TX_SAMPLER;
    uniform vec3 CAMERA_POSITION;
    uniform vec3 LIGHT_DIRECTION;
    uniform vec3 LIGHT_COLOR;
    uniform float OUTPUT_ALPHA;

    void main() {
        vec3 normal = normalize(v_normal);
        float sunDot = dot(normal, LIGHT_DIRECTION);
        float dayFactor = smoothstep(-0.1, 0.1, sunDot);

        vec3 day = texture(DAY_TX_SAMPLER, v_uv).rgb
            * LIGHT_COLOR * (0.1 + 0.9 * max(sunDot, 0.0));
        vec3 night = texture(NIGHT_TX_SAMPLER, v_uv).rgb;

        // Ocean glint from the specular map, daylit side only.
        vec3 view = normalize(CAMERA_POSITION - v_position);
        vec3 reflected = reflect(-LIGHT_DIRECTION, normal);
        float glint = pow(max(dot(view, reflected), 0.0), 32.0)
            * texture(SPECULAR_MAP_TX_SAMPLER, v_uv).r;

        vec3 color = mix(night, day + (LIGHT_COLOR * glint * dayFactor), dayFactor);
        out_color = vec4(color, OUTPUT_ALPHA);
    }
"#;

pub const CLOUDS_FRAGMENT: &str = r#"
    precision highp float;
    in vec3 v_normal;
    in vec2 v_uv;
    out vec4 out_color;

    uniform sampler2D TEXTURE_SAMPLER;
    uniform vec3 LIGHT_DIRECTION;
    uniform vec3 LIGHT_COLOR;
    uniform float OUTPUT_ALPHA;

    void main() {
        float density = texture(TEXTURE_SAMPLER, v_uv).r;
        vec3 normal = normalize(v_normal);
        float lit = 0.05 + 0.95 * max(dot(normal, LIGHT_DIRECTION), 0.0);
        out_color = vec4(LIGHT_COLOR * lit, density * OUTPUT_ALPHA);
    }
"#;

pub const ATMOSPHERE_FRAGMENT: &str = r#"
    precision highp float;
    in vec3 v_position;
    in vec3 v_normal;
    out vec4 out_color;

    uniform vec3 CAMERA_POSITION;
    uniform vec3 LIGHT_DIRECTION;
    uniform float ATMOSPHERE_DEPTH;
    uniform float OUTPUT_ALPHA;

    const vec3 SCATTER_COLOR = vec3(0.4, 0.7, 1.0);

    void main() {
        vec3 normal = normalize(v_normal);
        vec3 view = normalize(CAMERA_POSITION - v_position);
        // Rim thickens toward the limb, fades with the shell depth.
        float rim = 1.0 - max(dot(normal, view), 0.0);
        rim = pow(rim, 3.0) * (1.0 + ATMOSPHERE_DEPTH * 10.0);
        float sunlit = max(dot(normal, LIGHT_DIRECTION) + 0.3, 0.0);
        out_color = vec4(SCATTER_COLOR * sunlit, rim * OUTPUT_ALPHA);
    }
"#;

pub const HARDLIGHT_FRAGMENT: &str = r#"
    precision highp float;
    in vec3 v_normal;
    in vec2 v_uv;
    out vec4 out_color;

    uniform sampler2D TEXTURE_SAMPLER;
    uniform vec3 MODEL_COLOR;
    uniform vec3 LIGHT_DIRECTION;
    uniform float AMBIENT_CONTRIBUTION;
    uniform float DIFFUSE_CONTRIBUTION;
    uniform float OUTPUT_ALPHA;

    float hardlight(float base, float blend) {
        return (blend < 0.5)
            ? (2.0 * base * blend)
            : (1.0 - 2.0 * (1.0 - base) * (1.0 - blend));
    }

    void main() {
        vec3 normal = normalize(v_normal);
        float diffuse = max(dot(normal, LIGHT_DIRECTION), 0.0);
        float light = clamp(AMBIENT_CONTRIBUTION + DIFFUSE_CONTRIBUTION * diffuse, 0.0, 1.0);
        vec3 texel = texture(TEXTURE_SAMPLER, v_uv).rgb * MODEL_COLOR;
        vec3 color = vec3(
            hardlight(texel.r, light),
            hardlight(texel.g, light),
            hardlight(texel.b, light));
        out_color = vec4(color, OUTPUT_ALPHA);
    }
"#;

// Star billboards carry color and alpha per vertex: rim vertices fade
// to transparent around a bright center.
pub const STARS_FRAGMENT: &str = r#"
    precision highp float;
    in vec4 v_color;
    out vec4 out_color;

    uniform float OUTPUT_ALPHA;

    void main() {
        out_color = vec4(v_color.rgb, v_color.a * OUTPUT_ALPHA);
    }
"#;

/// Program name to fragment source. Every program shares [`BASIC_VERTEX`].
pub const PROGRAMS: [(&str, &str); 10] = [
    ("basic", BASIC_FRAGMENT),
    ("basic-texture", BASIC_TEXTURE_FRAGMENT),
    ("color", COLOR_FRAGMENT),
    ("overlay", OVERLAY_FRAGMENT),
    ("texture", TEXTURE_FRAGMENT),
    ("earth", EARTH_FRAGMENT),
    ("clouds", CLOUDS_FRAGMENT),
    ("atmosphere", ATMOSPHERE_FRAGMENT),
    ("hardlight", HARDLIGHT_FRAGMENT),
    ("stars", STARS_FRAGMENT),
];
