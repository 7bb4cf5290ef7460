//! Spoken response text.

use super::AlertBound;

pub const LAUNCH: &str = "Bienvenido a tu banda inteligente, tienes las opciones de consultar tu ritmo cardiaco y modificar los valores minimo y máximo en los que quieres recibir una notificación. ¿Qué deseas hacer?";

pub const HELP: &str = "Puedes consultar el pulso y las calorías quemadas de diferentes dispositivos especificando su nombre.";

/// Spoken by the fallback handler for every unrecovered error.
pub const GENERIC_ERROR: &str = "Hubo un error. Intenta de nuevo.";

pub const HEARTBEAT_UNAVAILABLE: &str = "No se pudo consultar el pulso. Intenta nuevamente.";

pub const CALORIES_UNAVAILABLE: &str =
    "No se pudo consultar las calorías quemadas. Intenta nuevamente.";

pub fn heartbeat(thing: &str, bpm: i64) -> String {
    format!("El pulso de {thing} es de {bpm} latidos por minuto.")
}

pub fn calories(thing: &str, calories: i64) -> String {
    format!("Has quemado {calories} calorías en {thing}.")
}

pub fn alert_missing_slots(bound: AlertBound) -> String {
    format!(
        "Por favor, especifica el nombre del dispositivo y el valor de pulsaciones {}.",
        bound.adjective()
    )
}

pub fn alert_configured(bound: AlertBound, thing: &str, value: &str) -> String {
    format!(
        "He configurado el valor {} de pulsaciones en {value} latidos por minuto para {thing}.",
        bound.adjective()
    )
}
