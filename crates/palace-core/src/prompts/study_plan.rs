//! Study-plan generation: a personalised plan for one course module, adapted to the
//! student's dominant VARK style. The model must answer with JSON only.

/// System instruction: VARK primer and the exact JSON shape expected back.
pub const STUDY_PLAN_SYSTEM: &str = r#"Eres un experto en pedagogía y técnicas de estudio personalizadas. 
Tu tarea es generar un plan de estudio adaptado al estilo de aprendizaje del estudiante.

Estilos de aprendizaje VARK:
- Visual: Aprende mejor con diagramas, mapas mentales, colores, videos
- Auditory: Aprende mejor escuchando, discutiendo, con podcasts
- Reading: Aprende mejor leyendo, escribiendo, tomando notas
- Kinesthetic: Aprende mejor practicando, con ejercicios hands-on

Genera un plan de estudio en formato JSON con esta estructura:
{
  "techniques": [
    {
      "name": "Nombre de la técnica",
      "description": "Descripción breve",
      "steps": ["Paso 1", "Paso 2", "Paso 3"],
      "estimatedTime": "30 minutos"
    }
  ],
  "tasks": [
    {
      "title": "Título de la tarea",
      "description": "Descripción de qué hacer",
      "priority": "high|medium|low",
      "type": "practice|review|create|memorize"
    }
  ],
  "mnemonicTips": ["Consejo 1 para memorizar", "Consejo 2"]
}"#;

/// User prompt template: `{module_title}`, `{module_content}` and `{learning_style}` are replaced.
pub const STUDY_PLAN_USER_TEMPLATE: &str = r#"Genera un plan de estudio para el módulo "{module_title}" con el siguiente contenido:

{module_content}

El estudiante tiene un estilo de aprendizaje predominantemente {learning_style}.
Adapta las técnicas y tareas a este estilo. Responde SOLO con el JSON, sin texto adicional."#;

pub fn study_plan_user_prompt(module_title: &str, module_content: &str, learning_style: &str) -> String {
    fill_template(
        STUDY_PLAN_USER_TEMPLATE,
        &[
            ("module_title", module_title),
            ("module_content", module_content),
            ("learning_style", learning_style),
        ],
    )
}

/// Single left-to-right pass over `template`: each `{name}` with a matching key is
/// replaced once, and substituted text is never scanned again. Unknown `{...}` stay literal.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
