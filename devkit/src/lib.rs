/*!
# Camlink DevKit - Stub du device et utilitaires de test

Bibliothèque facilitant les tests du relais sans matériel:
- Stub HTTP scriptable qui imite les routes du module caméra
- Adresse garantie injoignable pour simuler une coupure réseau
- Helpers async pour les assertions temporelles
*/

pub mod device_stub;
pub mod test_utils;

pub use device_stub::{unreachable_base_url, Respond, StubDevice};
pub use test_utils::{init_test_logging, wait_until};
